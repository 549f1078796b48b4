pub mod anchor;
pub mod digest;
pub mod event;
pub mod frame;
pub mod project;
pub mod run;
pub mod task;
pub mod trace;

pub use anchor::{anchor_order_key, Anchor, AnchorType};
pub use digest::Digest;
pub use event::{
    ArtifactPayload, Event, EventPayload, EventPosition, EventType, ToolCallPayload,
    ToolResultPayload,
};
pub use frame::{Frame, FrameState, FrameType};
pub use project::Project;
pub use run::{Run, RunState};
pub use task::{Task, TaskPriority, TaskStatus};
pub use trace::{Trace, TraceType};
