//! Shared data model and error envelope for the framestack memory engine.
//!
//! This crate has no knowledge of storage, embeddings, or concurrency; it
//! only defines the shapes that cross those boundaries so every other
//! crate in the workspace speaks the same vocabulary.

pub mod bundle;
pub mod domain;
pub mod error;
pub mod ids;
pub mod query;

pub use bundle::{Bundle, ContextDelta, DegradationFlags, HotStackEntry, Intent, Pointer, RelevantDigest, Usage};
pub use domain::{
    anchor_order_key, Anchor, AnchorType, ArtifactPayload, Digest, Event, EventPayload,
    EventPosition, EventType, Frame, FrameState, FrameType, Project, Run, RunState, Task,
    TaskPriority, TaskStatus, ToolCallPayload, ToolResultPayload, Trace, TraceType,
};
pub use error::{Error, ErrorKind, Result};
pub use ids::{AnchorId, EventId, FrameId, ProjectId, RunId, TaskId, TraceId};
pub use query::{QueryHit, QueryRequest, QueryResponse, StructuredFilter};
