use serde_json::Value;

use framestack_engine::store::frame_store;
use framestack_types::{Digest, Frame, FrameId, FrameType, Result, RunId};

use crate::engine::Engine;

impl Engine {
    /// `create(run, parent?, type, name, inputs) -> frame` (§4.2).
    pub async fn create_frame(
        &self,
        run_id: RunId,
        parent_id: Option<FrameId>,
        frame_type: FrameType,
        name: impl Into<String>,
        inputs: Value,
    ) -> Result<Frame> {
        let name = name.into();
        self.with_run_lock(run_id, move || async move {
            let mut db = self.0.db.lock().await;
            let frame = frame_store::create(&mut db, run_id, parent_id, frame_type, name, inputs)?;
            drop(db);
            self.0.cache.bump_watermark();
            Ok(frame)
        })
        .await
    }

    /// `close(frame, outputs, digest) -> frame` (§4.2). Embeds the digest
    /// text through the oracle when one is available; a degraded/failed
    /// embed just leaves the frame without a semantic vector rather than
    /// failing the close.
    pub async fn close_frame(&self, run_id: RunId, frame_id: FrameId, outputs: Value, digest: Digest) -> Result<Frame> {
        self.with_run_lock(run_id, move || async move {
            let embedding = {
                let _permit = self.acquire_oracle_permit().await;
                self.0.oracle.embed(&digest.as_text()).await.ok().map(|o| o.vector)
            };
            let mut db = self.0.db.lock().await;
            let frame = frame_store::close(&mut db, frame_id, outputs, digest, embedding)?;
            drop(db);
            self.0.cache.bump_watermark();
            Ok(frame)
        })
        .await
    }

    pub async fn lookup_frame(&self, frame_id: FrameId) -> Result<Frame> {
        let db = self.0.db.lock().await;
        frame_store::lookup(&db, frame_id)
    }

    /// The current root-to-leaf active path for `run_id` (§4.2).
    pub async fn active_path(&self, run_id: RunId) -> Result<Vec<Frame>> {
        let db = self.0.db.lock().await;
        frame_store::active_path(&db, run_id)
    }

    /// Transition every frame idle past the configured inactivity window
    /// to `Stalled`. Meant to be driven by a caller-owned timer, not run
    /// automatically by the engine itself.
    pub async fn apply_stall_window(&self, run_id: RunId) -> Result<u64> {
        let window = chrono::Duration::seconds(self.0.config.frame_inactivity_window_secs);
        let mut db = self.0.db.lock().await;
        frame_store::apply_stall_window(&mut db, run_id, window, chrono::Utc::now())
    }

    /// Bulk-delete a closed frame's events, anchors, and row (§4.1 tombstoning).
    pub async fn tombstone_frame(&self, frame_id: FrameId) -> Result<()> {
        let mut db = self.0.db.lock().await;
        frame_store::tombstone(&mut db, frame_id)?;
        drop(db);
        self.0.cache.bump_watermark();
        Ok(())
    }
}
