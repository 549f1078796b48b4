use framestack_engine::assemble;
use framestack_types::{Bundle, ContextDelta, Intent, Result, RunId};

use crate::engine::Engine;

impl Engine {
    /// `assemble_context(run, intent, token_budget, delta) -> bundle`
    /// (§4.6). Bounded by the oracle semaphore since filling the
    /// relevant-digests slice may call the embedding oracle, and
    /// serialized against other writers on the same run since it applies
    /// `delta` to the log before reading it back.
    pub async fn assemble_context(
        &self,
        run_id: RunId,
        intent: Intent,
        token_budget: u64,
        delta: ContextDelta,
    ) -> Result<Bundle> {
        let _permit = self.acquire_oracle_permit().await;
        self.with_run_lock(run_id, move || async move {
            let mut db = self.0.db.lock().await;
            assemble(&mut db, &self.0.clock, &self.0.oracle, &self.0.project_id, run_id, intent, token_budget, delta).await
        })
        .await
    }
}
