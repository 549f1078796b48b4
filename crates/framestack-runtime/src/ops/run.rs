use framestack_engine::store::frame_store;
use framestack_types::{Result, Run, RunState};

use crate::engine::Engine;

impl Engine {
    /// `start_run() -> run` (§10 supplemented run lifecycle helper).
    pub async fn start_run(&self) -> Result<Run> {
        let run = Run::start(self.0.project_id.clone());
        let mut db = self.0.db.lock().await;
        frame_store::start_run(&mut db, &run)?;
        Ok(run)
    }

    /// `finish_run(run, state) -> run`. `state` must be a terminal state;
    /// see [`Run::finish`].
    pub async fn finish_run(&self, mut run: Run, state: RunState) -> Result<Run> {
        self.with_run_lock(run.id, move || async move {
            run.finish(state);
            let mut db = self.0.db.lock().await;
            frame_store::finish_run(&mut db, &run)?;
            Ok(run)
        })
        .await
    }
}
