use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AnchorId, FrameId};

/// Recognized anchor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorType {
    Fact,
    Decision,
    Constraint,
    InterfaceContract,
    Todo,
    Risk,
}

/// A pinned fact, decision, or constraint bound to one frame. Anchors are
/// immutable after creation; supersession is expressed by a newer anchor
/// carrying a `supersedes` reference, not by mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anchor {
    pub id: AnchorId,
    pub frame_id: FrameId,
    pub anchor_type: AnchorType,
    pub text: String,
    /// Priority in `[0, 10]`.
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<AnchorId>,
    pub created_at: DateTime<Utc>,
}

impl Anchor {
    pub fn new(
        frame_id: FrameId,
        anchor_type: AnchorType,
        text: impl Into<String>,
        priority: u8,
    ) -> Self {
        Self {
            id: AnchorId::new(),
            frame_id,
            anchor_type,
            text: text.into(),
            priority: priority.min(10),
            supersedes: None,
            created_at: Utc::now(),
        }
    }

    pub fn superseding(mut self, previous: AnchorId) -> Self {
        self.supersedes = Some(previous);
        self
    }
}

/// Stable ordering used by the anchor index: priority descending, creation
/// ascending (a stable tie-break so equal-priority anchors keep insertion
/// order).
pub fn anchor_order_key(anchor: &Anchor) -> (std::cmp::Reverse<u8>, DateTime<Utc>) {
    (std::cmp::Reverse(anchor.priority), anchor.created_at)
}
