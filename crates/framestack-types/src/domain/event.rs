use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{EventId, FrameId};

/// Recognized event kinds appended to a frame's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    UserMessage,
    AssistantMessage,
    ToolCall,
    ToolResult,
    Decision,
    Constraint,
    Artifact,
    Observation,
}

/// `tool_call` payload: tool name, argument map, caller-supplied id, timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub tool_name: String,
    pub arguments: Value,
    pub call_id: String,
}

/// `tool_result` payload: the corresponding call id, success flag, and either
/// a structured result or an error message, plus duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultPayload {
    pub call_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub duration_ms: u64,
}

/// `artifact` payload: a content hash or URI reference plus a kind tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPayload {
    pub reference: String,
    pub kind: String,
}

/// The typed body of an event. Unknown keys on the wire are preserved
/// verbatim in `extra` so that forward-incompatible payload additions
/// round-trip without loss (backward compatibility guarantee in the
/// external interface spec).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventPayload {
    UserMessage {
        text: String,
        #[serde(flatten)]
        extra: Value,
    },
    AssistantMessage {
        text: String,
        #[serde(flatten)]
        extra: Value,
    },
    ToolCall {
        #[serde(flatten)]
        call: ToolCallPayload,
        #[serde(flatten)]
        extra: Value,
    },
    ToolResult {
        #[serde(flatten)]
        result: ToolResultPayload,
        #[serde(flatten)]
        extra: Value,
    },
    Decision {
        text: String,
        #[serde(flatten)]
        extra: Value,
    },
    Constraint {
        text: String,
        #[serde(flatten)]
        extra: Value,
    },
    Artifact {
        #[serde(flatten)]
        artifact: ArtifactPayload,
        #[serde(flatten)]
        extra: Value,
    },
    Observation {
        text: String,
        #[serde(flatten)]
        extra: Value,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::UserMessage { .. } => EventType::UserMessage,
            EventPayload::AssistantMessage { .. } => EventType::AssistantMessage,
            EventPayload::ToolCall { .. } => EventType::ToolCall,
            EventPayload::ToolResult { .. } => EventType::ToolResult,
            EventPayload::Decision { .. } => EventType::Decision,
            EventPayload::Constraint { .. } => EventType::Constraint,
            EventPayload::Artifact { .. } => EventType::Artifact,
            EventPayload::Observation { .. } => EventType::Observation,
        }
    }

    /// Best-effort plain-text projection, used by keyword scoring and token
    /// estimation; never fails, loses structure for tool events.
    pub fn as_text(&self) -> String {
        match self {
            EventPayload::UserMessage { text, .. }
            | EventPayload::AssistantMessage { text, .. }
            | EventPayload::Decision { text, .. }
            | EventPayload::Constraint { text, .. }
            | EventPayload::Observation { text, .. } => text.clone(),
            EventPayload::ToolCall { call, .. } => {
                format!("{}({})", call.tool_name, call.arguments)
            }
            EventPayload::ToolResult { result, .. } => result
                .error_message
                .clone()
                .or_else(|| result.result.as_ref().map(|v| v.to_string()))
                .unwrap_or_default(),
            EventPayload::Artifact { artifact, .. } => {
                format!("{}:{}", artifact.kind, artifact.reference)
            }
        }
    }
}

/// Which shard an event's sequence number belongs to, and the sequence
/// number itself. Shard assignment is `hash(frame_id) mod shard_count`;
/// ordering across shards for a single frame is `(seq, shard)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventPosition {
    pub seq: u64,
    pub shard: u16,
}

/// An append-only record bound to a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub frame_id: FrameId,
    pub position: EventPosition,
    pub payload: EventPayload,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }
}
