use std::path::Path;

use framestack_core::project_id_from_root;
use framestack_index::queries;
use framestack_types::{Project, ProjectId, Result};

use crate::engine::Engine;

impl Engine {
    /// The project id a given root resolves to, without opening a store
    /// (§10 supplemented feature: project registration).
    pub fn resolve_project_id(project_root: &Path) -> ProjectId {
        project_id_from_root(&project_root.to_string_lossy())
    }

    /// Ensure this engine's project row exists, returning it either way.
    /// Idempotent: calling it again just re-reads the stored row.
    pub async fn register_project(&self, display_name: impl Into<String>) -> Result<Project> {
        let db = self.0.db.lock().await;
        if let Some(existing) = queries::project::get(db.conn(), &self.0.project_id)? {
            return Ok(existing);
        }
        let project = Project::new(self.0.project_id.clone(), display_name);
        queries::project::upsert(db.conn(), &project)?;
        Ok(project)
    }

    pub async fn get_project(&self) -> Result<Option<Project>> {
        let db = self.0.db.lock().await;
        Ok(queries::project::get(db.conn(), &self.0.project_id)?)
    }
}
