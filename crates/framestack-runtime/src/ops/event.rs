use framestack_engine::store::event_log;
use framestack_engine::{compress_if_aged, TraceBuilder, TraceConfig};
use framestack_index::queries;
use framestack_types::{Event, EventPayload, FrameId, Result, RunId, Trace};

use crate::engine::Engine;

/// How many persisted traces a single [`Engine::compress_aged_traces`]
/// sweep inspects. Not a correctness bound — just keeps one sweep call
/// from scanning an unbounded table; callers needing more run it again.
const COMPRESSION_SWEEP_LIMIT: usize = 10_000;

impl Engine {
    /// `append(frame_id, event) -> event` (§4.1). Also feeds the run's
    /// trace builder (§4.7): a tool-call/tool-result event may force a
    /// bounded trace closed, which is persisted immediately.
    pub async fn append_event(&self, run_id: RunId, frame_id: FrameId, payload: EventPayload) -> Result<Event> {
        let event = {
            let mut db = self.0.db.lock().await;
            event_log::append(&mut db, &self.0.clock, frame_id, payload)?
        };

        let closed = {
            let mut traces = self.0.traces.lock().await;
            let config = TraceConfig {
                gap: chrono::Duration::seconds(self.0.config.trace_gap_secs),
                max_len: self.0.config.trace_max_len,
            };
            let builder = traces.entry(run_id).or_insert_with(|| TraceBuilder::new(config));
            builder.push(event.clone())
        };

        if let Some(trace) = &closed {
            let db = self.0.db.lock().await;
            queries::trace::insert(db.conn(), trace)?;
        }

        Ok(event)
    }

    pub async fn range_events(&self, frame_id: FrameId, from_seq: u64, limit: usize) -> Result<Vec<Event>> {
        let db = self.0.db.lock().await;
        event_log::range(&db, frame_id, from_seq, limit)
    }

    pub async fn tail_events(&self, frame_id: FrameId, n: usize) -> Result<Vec<Event>> {
        let db = self.0.db.lock().await;
        event_log::tail(&db, frame_id, n)
    }

    /// Force-close a run's in-progress trace without waiting out the idle
    /// gap, e.g. when finishing a run.
    pub async fn flush_run_trace(&self, run_id: RunId) -> Result<Option<Trace>> {
        let closed = {
            let mut traces = self.0.traces.lock().await;
            traces.get_mut(&run_id).and_then(|b| b.flush())
        };
        if let Some(trace) = &closed {
            let db = self.0.db.lock().await;
            queries::trace::insert(db.conn(), trace)?;
        }
        Ok(closed)
    }

    pub async fn list_recent_traces(&self, limit: usize) -> Result<Vec<Trace>> {
        let db = self.0.db.lock().await;
        Ok(queries::trace::list_recent(db.conn(), limit)?)
    }

    /// Apply age-based compression (§4.7) to every persisted trace older
    /// than the configured threshold. Returns how many were compressed.
    pub async fn compress_aged_traces(&self) -> Result<u64> {
        let db = self.0.db.lock().await;
        let traces = queries::trace::list_recent(db.conn(), COMPRESSION_SWEEP_LIMIT)?;
        let now = chrono::Utc::now();
        let mut compressed = 0u64;
        for trace in &traces {
            if let Some(shrunk) = compress_if_aged(trace, now, self.0.config.compress_age_hours) {
                queries::trace::insert(db.conn(), &shrunk)?;
                compressed += 1;
            }
        }
        Ok(compressed)
    }
}
