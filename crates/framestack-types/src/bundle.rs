use serde::{Deserialize, Serialize};

use crate::domain::{Anchor, Event};
use crate::ids::FrameId;

/// One entry of the hot stack: a frame on the active root-to-leaf path,
/// together with the pieces the context assembler attaches to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotStackEntry {
    pub frame_id: FrameId,
    pub goal: String,
    pub constraints: Vec<String>,
    pub definitions: Vec<String>,
    pub anchors: Vec<Anchor>,
    pub recent_events: Vec<Event>,
    pub active_artifacts: Vec<String>,
}

/// A retrieved frame digest included in the bundle, scored and reasoned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevantDigest {
    pub frame_id: FrameId,
    pub name: String,
    pub digest_text: String,
    pub score: f64,
    pub reason: String,
}

/// A reference to data not embedded in the bundle (artifact blob locations).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pointer {
    pub uri: String,
    pub description: String,
}

/// Token/source accounting attached to a bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub tokens_used: u64,
    pub token_budget: u64,
    pub sources_counted: u64,
}

/// Degradation flags a bundle may carry when a component failed soft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DegradationFlags {
    #[serde(default)]
    pub degraded_semantic: bool,
    #[serde(default)]
    pub degraded_incomplete: bool,
}

/// The token-budgeted output of context assembly returned to the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub hot_stack: Vec<HotStackEntry>,
    pub anchors: Vec<Anchor>,
    pub relevant_digests: Vec<RelevantDigest>,
    pub pointers: Vec<Pointer>,
    pub usage: Usage,
    #[serde(default)]
    pub flags: DegradationFlags,
}

/// Which natural-language intent a context request declares; shapes default
/// budget slicing in the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Coding,
    Debugging,
    Writing,
    Other,
}

/// Caller-submitted delta appended atomically with assembly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_message: Option<String>,
    #[serde(default)]
    pub tool_events: Vec<crate::domain::EventPayload>,
}

impl ContextDelta {
    pub fn is_empty(&self) -> bool {
        self.user_message.is_none() && self.assistant_message.is_none() && self.tool_events.is_empty()
    }
}
