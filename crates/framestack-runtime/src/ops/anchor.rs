use framestack_engine::store::anchor_index;
use framestack_types::{Anchor, AnchorId, AnchorType, FrameId, Result};

use crate::engine::Engine;

impl Engine {
    /// `add(frame, type, text, priority, supersedes?) -> anchor` (§4.3).
    pub async fn add_anchor(
        &self,
        frame_id: FrameId,
        anchor_type: AnchorType,
        text: impl Into<String>,
        priority: u8,
        supersedes: Option<AnchorId>,
    ) -> Result<Anchor> {
        let text = text.into();
        let mut db = self.0.db.lock().await;
        let anchor = anchor_index::add(&mut db, frame_id, anchor_type, text, priority, supersedes)?;
        drop(db);
        self.0.cache.bump_watermark();
        Ok(anchor)
    }

    /// `list(frame, types?, min_priority?) -> anchors`. Includes
    /// superseded anchors (§4.3: visible unless the caller filters them).
    pub async fn list_anchors(
        &self,
        frame_id: FrameId,
        types: Option<&[AnchorType]>,
        min_priority: Option<u8>,
    ) -> Result<Vec<Anchor>> {
        let db = self.0.db.lock().await;
        anchor_index::list(&db, frame_id, types, min_priority)
    }

    /// `list` filtered down to anchors not themselves superseded.
    pub async fn list_live_anchors(
        &self,
        frame_id: FrameId,
        types: Option<&[AnchorType]>,
        min_priority: Option<u8>,
    ) -> Result<Vec<Anchor>> {
        let db = self.0.db.lock().await;
        anchor_index::list_live(&db, frame_id, types, min_priority)
    }
}
