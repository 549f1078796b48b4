//! `EngineWorld` pattern for declarative integration test setup.
//!
//! Mirrors the teacher's `TestWorldBuilder` fluent-interface idiom, adapted
//! from "spawn a CLI against a sample-log directory" to "open an engine
//! against a fresh project root" — there is no CLI surface in this
//! workspace, so the thing under test is `framestack_runtime::Engine`
//! directly.

use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;

use framestack_runtime::{Config, Engine};
use framestack_types::{Project, Run, RunState};

/// Builder for constructing an [`EngineWorld`] with fine-grained control.
///
/// # Example
/// ```no_run
/// use framestack_testing::EngineWorld;
///
/// let world = EngineWorld::builder().build().unwrap();
/// assert!(world.project_root().exists());
/// ```
pub struct EngineWorldBuilder {
    config: Config,
    register_project: bool,
}

impl EngineWorldBuilder {
    pub fn new() -> Self {
        Self { config: Config::default(), register_project: true }
    }

    /// Use a caller-supplied config instead of the default (e.g. to shrink
    /// `trace_gap_secs` or force `embedding_provider = "remote"` for a
    /// semantic-degradation scenario).
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Skip the implicit `register_project` call some scenarios want to
    /// exercise missing (e.g. testing `get_project` on a fresh store).
    pub fn without_project_registration(mut self) -> Self {
        self.register_project = false;
        self
    }

    pub fn build(self) -> Result<EngineWorld> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let engine = Engine::open(&root, self.config)?;
        let project = if self.register_project {
            Some(futures_block_on(engine.register_project("test-project"))?)
        } else {
            None
        };
        Ok(EngineWorld { _temp_dir: temp_dir, root, engine, project })
    }
}

impl Default for EngineWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An isolated engine plus the temp project root backing it. Dropping the
/// world removes the directory.
pub struct EngineWorld {
    _temp_dir: TempDir,
    root: PathBuf,
    engine: Engine,
    project: Option<Project>,
}

impl EngineWorld {
    pub fn builder() -> EngineWorldBuilder {
        EngineWorldBuilder::new()
    }

    /// Open a world with every default (registered project, default config).
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn project_root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Start a run and block on it; most scenario tests want a run id up
    /// front without writing `block_on` at every call site.
    pub fn start_run(&self) -> Result<Run> {
        Ok(futures_block_on(self.engine.start_run())?)
    }

    pub fn finish_run(&self, run: Run, state: RunState) -> Result<Run> {
        Ok(futures_block_on(self.engine.finish_run(run, state))?)
    }
}

/// Blocks the calling thread on a future using a throwaway current-thread
/// runtime. `EngineWorld`'s synchronous convenience methods exist so
/// non-async test bodies (`#[test]`, not `#[tokio::test]`) can still drive
/// the async `Engine` API; async test bodies should call `engine()`
/// methods directly instead of going through this.
fn futures_block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().enable_all().build().expect("build current-thread runtime").block_on(fut)
}
