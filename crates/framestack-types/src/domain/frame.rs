use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{FrameId, RunId};

/// Recognized frame kinds. Unknown values are rejected at the boundary
/// rather than represented as an open string (see the redesign notes on
/// string-typed enumerations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    Task,
    Subtask,
    ToolScope,
    Review,
    Write,
    Debug,
    Feature,
    Bug,
    Refactor,
    Architecture,
    Milestone,
}

impl FrameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameType::Task => "task",
            FrameType::Subtask => "subtask",
            FrameType::ToolScope => "tool_scope",
            FrameType::Review => "review",
            FrameType::Write => "write",
            FrameType::Debug => "debug",
            FrameType::Feature => "feature",
            FrameType::Bug => "bug",
            FrameType::Refactor => "refactor",
            FrameType::Architecture => "architecture",
            FrameType::Milestone => "milestone",
        }
    }
}

/// Lifecycle state of a [`Frame`]. See the state machine in the frame
/// store design: `active -> stalled -> closed`, or `active -> closed`
/// directly. Closed frames never reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameState {
    Active,
    Stalled,
    Closed,
}

/// A node on the reasoning call stack representing one goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    pub run_id: RunId,
    /// `None` only for the run's root frame.
    pub parent_id: Option<FrameId>,
    /// `parent.depth + 1`; the root is `0`.
    pub depth: u32,
    pub frame_type: FrameType,
    pub name: String,
    pub state: FrameState,
    pub inputs: Value,
    /// Populated at close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_json: Option<Value>,
    /// Embedding of `digest_text`, populated at close when an oracle ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Last time any event was appended under this frame; drives stall detection.
    pub last_activity_at: DateTime<Utc>,
}

impl Frame {
    pub fn new_root(run_id: RunId, frame_type: FrameType, name: impl Into<String>, inputs: Value) -> Self {
        let now = Utc::now();
        Self {
            id: FrameId::new(),
            run_id,
            parent_id: None,
            depth: 0,
            frame_type,
            name: name.into(),
            state: FrameState::Active,
            inputs,
            outputs: None,
            digest_text: None,
            digest_json: None,
            digest_embedding: None,
            created_at: now,
            closed_at: None,
            last_activity_at: now,
        }
    }

    pub fn new_child(
        parent: &Frame,
        frame_type: FrameType,
        name: impl Into<String>,
        inputs: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: FrameId::new(),
            run_id: parent.run_id,
            parent_id: Some(parent.id),
            depth: parent.depth + 1,
            frame_type,
            name: name.into(),
            state: FrameState::Active,
            inputs,
            outputs: None,
            digest_text: None,
            digest_json: None,
            digest_embedding: None,
            created_at: now,
            closed_at: None,
            last_activity_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, FrameState::Active | FrameState::Stalled)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn close(&mut self, outputs: Value, digest_text: String, digest_json: Value) {
        self.outputs = Some(outputs);
        self.digest_text = Some(digest_text);
        self.digest_json = Some(digest_json);
        self.state = FrameState::Closed;
        self.closed_at = Some(Utc::now());
    }

    pub fn mark_stalled(&mut self) {
        if self.state == FrameState::Active {
            self.state = FrameState::Stalled;
        }
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_activity_at = at;
        if self.state == FrameState::Stalled {
            self.state = FrameState::Active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_depth_is_parent_depth_plus_one() {
        let run = RunId::new();
        let root = Frame::new_root(run, FrameType::Task, "root", Value::Null);
        let child = Frame::new_child(&root, FrameType::Subtask, "child", Value::Null);
        assert_eq!(child.depth, root.depth + 1);
        assert_eq!(child.parent_id, Some(root.id));
    }

    #[test]
    fn root_has_depth_zero_and_no_parent() {
        let root = Frame::new_root(RunId::new(), FrameType::Task, "root", Value::Null);
        assert_eq!(root.depth, 0);
        assert!(root.is_root());
    }

    #[test]
    fn touching_a_stalled_frame_reactivates_it() {
        let mut frame = Frame::new_root(RunId::new(), FrameType::Task, "root", Value::Null);
        frame.mark_stalled();
        assert_eq!(frame.state, FrameState::Stalled);
        frame.touch(Utc::now());
        assert_eq!(frame.state, FrameState::Active);
    }
}
