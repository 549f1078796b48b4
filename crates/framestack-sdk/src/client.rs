use std::path::{Path, PathBuf};

use serde_json::Value;

use framestack_runtime::{Config, Engine};
use framestack_types::{
    Anchor, AnchorId, AnchorType, Bundle, ContextDelta, Digest, Event, EventPayload, Frame, FrameId, FrameType,
    Intent, Project, QueryRequest, QueryResponse, Run, RunId, RunState, Task, Trace,
};

use crate::error::Result;

/// The public entry point to a project's frame-stack memory: a thin facade
/// over [`framestack_runtime::Engine`] exposing the context/query
/// request-response shapes of spec.md §6. Cheap to clone — every clone
/// shares the same underlying engine.
#[derive(Clone)]
pub struct ContextClient {
    engine: Engine,
}

impl ContextClient {
    /// Open (creating on first use) the store under `project_root`, with
    /// default configuration.
    pub fn connect(project_root: impl Into<PathBuf>) -> Result<Self> {
        Self::connect_with_config(project_root, Config::default())
    }

    pub fn connect_with_config(project_root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let engine = Engine::open(&project_root.into(), config)?;
        Ok(Self { engine })
    }

    /// The project id a given root resolves to, without opening a store.
    pub fn resolve_project_id(project_root: &Path) -> framestack_types::ProjectId {
        Engine::resolve_project_id(project_root)
    }

    /// Access to the full `Engine` facade for operations this thin surface
    /// doesn't wrap individually.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub async fn register_project(&self, display_name: impl Into<String>) -> Result<Project> {
        Ok(self.engine.register_project(display_name).await?)
    }

    pub async fn project(&self) -> Result<Option<Project>> {
        Ok(self.engine.get_project().await?)
    }

    /// Start a new run and return a [`RunHandle`] bound to it.
    pub async fn start_run(&self) -> Result<RunHandle> {
        let run = self.engine.start_run().await?;
        Ok(RunHandle { client: self.clone(), run })
    }

    pub fn run(&self, run: Run) -> RunHandle {
        RunHandle { client: self.clone(), run }
    }

    /// `query(request) -> response` (§4.5, §4.9): natural-language or
    /// structured retrieval against the whole project, independent of any
    /// one run.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        Ok(self.engine.query(request).await?)
    }

    /// Parse a free-text query into its structured interpretation without
    /// touching storage (§4.8).
    pub fn parse_query(&self, text: &str) -> framestack_engine::ParsedQuery {
        self.engine.parse_query(text)
    }

    pub fn put_artifact(&self, bytes: &[u8]) -> Result<String> {
        Ok(self.engine.put_artifact(bytes)?)
    }

    pub fn get_artifact(&self, uri: &str) -> Result<Vec<u8>> {
        Ok(self.engine.get_artifact(uri)?)
    }

    pub fn append_task(&self, task: &Task) -> Result<()> {
        Ok(self.engine.append_task(task)?)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.engine.list_tasks()?)
    }

    pub async fn lookup_frame(&self, frame_id: FrameId) -> Result<Frame> {
        Ok(self.engine.lookup_frame(frame_id).await?)
    }

    pub async fn list_anchors(&self, frame_id: FrameId, types: Option<&[AnchorType]>, min_priority: Option<u8>) -> Result<Vec<Anchor>> {
        Ok(self.engine.list_anchors(frame_id, types, min_priority).await?)
    }
}

/// A run in progress, scoped so frame/event/anchor/context calls don't all
/// need to repeat the run id. Mirrors the teacher's session-handle idiom,
/// bound to a live run instead of a replayed transcript.
pub struct RunHandle {
    client: ContextClient,
    run: Run,
}

impl RunHandle {
    pub fn id(&self) -> RunId {
        self.run.id
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    /// `create(parent?, type, name, inputs) -> frame` (§4.2).
    pub async fn create_frame(
        &self,
        parent_id: Option<FrameId>,
        frame_type: FrameType,
        name: impl Into<String>,
        inputs: Value,
    ) -> Result<Frame> {
        Ok(self.client.engine.create_frame(self.run.id, parent_id, frame_type, name, inputs).await?)
    }

    pub async fn create_root_frame(&self, frame_type: FrameType, name: impl Into<String>, inputs: Value) -> Result<Frame> {
        self.create_frame(None, frame_type, name, inputs).await
    }

    /// `close(frame, outputs, digest) -> frame` (§4.2).
    pub async fn close_frame(&self, frame_id: FrameId, outputs: Value, digest: Digest) -> Result<Frame> {
        Ok(self.client.engine.close_frame(self.run.id, frame_id, outputs, digest).await?)
    }

    pub async fn active_path(&self) -> Result<Vec<Frame>> {
        Ok(self.client.engine.active_path(self.run.id).await?)
    }

    /// Transition every frame idle past the configured inactivity window
    /// to `Stalled`; caller-driven (§4.2), not run on a background timer.
    pub async fn apply_stall_window(&self) -> Result<u64> {
        Ok(self.client.engine.apply_stall_window(self.run.id).await?)
    }

    pub async fn add_anchor(
        &self,
        frame_id: FrameId,
        anchor_type: AnchorType,
        text: impl Into<String>,
        priority: u8,
        supersedes: Option<AnchorId>,
    ) -> Result<Anchor> {
        Ok(self.client.engine.add_anchor(frame_id, anchor_type, text, priority, supersedes).await?)
    }

    pub async fn append_event(&self, frame_id: FrameId, payload: EventPayload) -> Result<Event> {
        Ok(self.client.engine.append_event(self.run.id, frame_id, payload).await?)
    }

    pub async fn tail_events(&self, frame_id: FrameId, n: usize) -> Result<Vec<Event>> {
        Ok(self.client.engine.tail_events(frame_id, n).await?)
    }

    pub async fn range_events(&self, frame_id: FrameId, from_seq: u64, limit: usize) -> Result<Vec<Event>> {
        Ok(self.client.engine.range_events(frame_id, from_seq, limit).await?)
    }

    /// `assemble(intent, token_budget, delta) -> bundle` (§4.6): the
    /// headline operation, building a token-budgeted context bundle from
    /// this run's hot stack plus project-wide relevant digests.
    pub async fn assemble_context(&self, intent: Intent, token_budget: u64, delta: ContextDelta) -> Result<Bundle> {
        Ok(self.client.engine.assemble_context(self.run.id, intent, token_budget, delta).await?)
    }

    /// Force-close the run's in-progress tool-call trace without waiting
    /// out the idle gap (§4.7), e.g. right before `finish`.
    pub async fn flush_trace(&self) -> Result<Option<Trace>> {
        Ok(self.client.engine.flush_run_trace(self.run.id).await?)
    }

    /// Finish the run with a terminal state, consuming the handle.
    pub async fn finish(self, state: RunState) -> Result<Run> {
        Ok(self.client.engine.finish_run(self.run, state).await?)
    }
}
