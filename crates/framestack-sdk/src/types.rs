//! Type re-exports for the SDK.
//!
//! Centralizes the types SDK consumers work with so the internal crate
//! boundary can move without breaking callers building on top of this
//! crate.

// ============================================================================
// Data model (from framestack-types::domain)
// ============================================================================

pub use framestack_types::{
    Anchor, AnchorId, AnchorType, ArtifactPayload, Digest, Event, EventId, EventPayload,
    EventPosition, EventType, Frame, FrameId, FrameState, FrameType, Project, ProjectId, Run,
    RunId, RunState, Task, TaskId, TaskPriority, TaskStatus, ToolCallPayload, ToolResultPayload,
    Trace, TraceId, TraceType,
};

// ============================================================================
// Context bundle shapes (from framestack-types::bundle)
// ============================================================================

pub use framestack_types::{
    Bundle, ContextDelta, DegradationFlags, HotStackEntry, Intent, Pointer, RelevantDigest, Usage,
};

// ============================================================================
// Query request/response shapes (from framestack-types::query)
// ============================================================================

pub use framestack_types::{QueryHit, QueryRequest, QueryResponse, StructuredFilter};

// ============================================================================
// Error envelope (from framestack-types::error)
// ============================================================================

pub use framestack_types::{Error, ErrorKind, Result};

// ============================================================================
// Retrieval and intent-parsing types (from framestack-engine)
// ============================================================================

pub use framestack_engine::{
    GroupBy, InterpretedQuery, OutputFormat, ParsedQuery, RetrievalOutcome, SortKey, Strategy,
};

// ============================================================================
// Runtime configuration (from framestack-runtime)
// ============================================================================

pub use framestack_runtime::Config;
