use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, Semaphore, SemaphorePermit};

use framestack_core::{project_id_from_root, Clock};
use framestack_engine::{Cache, RetrievalOutcome, TraceBuilder};
use framestack_index::Database;
use framestack_providers::{unconfigured_remote, EmbeddingOracle};
use framestack_types::{ProjectId, Result, RunId};

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::layout::ProjectLayout;
use crate::tasks::TaskLog;

/// State shared by every clone of an [`Engine`] handle.
pub(crate) struct Shared {
    pub(crate) layout: ProjectLayout,
    pub(crate) config: Config,
    pub(crate) project_id: ProjectId,
    pub(crate) db: AsyncMutex<Database>,
    pub(crate) oracle: EmbeddingOracle,
    pub(crate) oracle_semaphore: Semaphore,
    pub(crate) cache: Cache<RetrievalOutcome>,
    pub(crate) clock: Clock,
    pub(crate) run_locks: AsyncMutex<HashMap<RunId, Arc<AsyncMutex<()>>>>,
    pub(crate) traces: AsyncMutex<HashMap<RunId, TraceBuilder>>,
    pub(crate) artifacts: ArtifactStore,
    pub(crate) tasks: TaskLog,
}

/// Facade over the whole FrameStack memory runtime (§2, §5 of the design):
/// one [`Database`], one [`EmbeddingOracle`], one [`Cache`], the per-run
/// mutexes and the bounded oracle semaphore the concurrency model
/// describes, and the async operations a caller (SDK, future CLI) drives.
///
/// An `Engine` is cheap to clone — every clone shares the same state via
/// an `Arc`, the unit of sharing across async tasks.
#[derive(Clone)]
pub struct Engine(pub(crate) Arc<Shared>);

impl Engine {
    /// Open (creating on first use) the FrameStack store under
    /// `project_root`, per the on-disk layout in spec.md §6.
    pub fn open(project_root: &Path, config: Config) -> Result<Self> {
        let layout = ProjectLayout::new(project_root);
        layout.ensure_directories()?;

        let db_path = config.resolved_db_path(&layout.data_dir());
        let db = Database::open(&db_path)?;

        // Rehydrate the clock from whatever is already persisted (§4.1,
        // §5): reopening an existing store must resume each shard's
        // counter past its last-persisted seq, never restart it at 0.
        let clock = Clock::new(config.event_log_shards);
        for (shard, next_seq) in framestack_index::queries::event::next_seq_by_shard(db.conn())? {
            clock.seed_shard(shard, next_seq);
        }

        let project_id = project_id_from_root(&project_root.to_string_lossy());

        // `remote`/`hybrid` bind to the out-of-scope remote embedding
        // collaborator (§9); absent a delegate wired in by the host
        // application, every call degrades to the local encoder.
        let oracle = match config.embedding_provider.as_str() {
            "remote" => EmbeddingOracle::remote(unconfigured_remote(config.embedding_dim)),
            "hybrid" => EmbeddingOracle::hybrid(unconfigured_remote(config.embedding_dim), config.embedding_dim),
            _ => EmbeddingOracle::local(config.embedding_dim),
        };

        let cache = Cache::new(config.cache_max_bytes, Duration::from_secs(config.cache_default_ttl_secs));
        let artifacts = ArtifactStore::new(layout.artifacts_dir());
        let tasks = TaskLog::new(layout.tasks_path());
        let oracle_semaphore = Semaphore::new(config.oracle_concurrency.max(1));

        let shared = Shared {
            layout,
            project_id,
            db: AsyncMutex::new(db),
            oracle,
            oracle_semaphore,
            cache,
            clock,
            run_locks: AsyncMutex::new(HashMap::new()),
            traces: AsyncMutex::new(HashMap::new()),
            artifacts,
            tasks,
            config,
        };
        Ok(Self(Arc::new(shared)))
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.0.project_id
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.0.layout
    }

    /// Acquire one of the bounded oracle permits (§5). `None` is never
    /// returned in practice — the semaphore is never closed — but callers
    /// treat acquisition failure as "proceed without the bound" rather
    /// than panicking, since a missed bound is not a correctness issue.
    pub(crate) async fn acquire_oracle_permit(&self) -> Option<SemaphorePermit<'_>> {
        self.0.oracle_semaphore.acquire().await.ok()
    }

    /// The mutex serializing writers against `run_id` (§5): concurrent
    /// calls for different runs proceed independently; calls against the
    /// same run queue behind whichever is already in flight.
    async fn run_lock(&self, run_id: RunId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.0.run_locks.lock().await;
        locks.entry(run_id).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Run `f` while holding `run_id`'s write lock.
    pub(crate) async fn with_run_lock<F, Fut, T>(&self, run_id: RunId, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = self.run_lock(run_id).await;
        let _guard = lock.lock().await;
        f().await
    }
}
