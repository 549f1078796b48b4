use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::ProjectId;

/// A project: the stable scope that runs, frames, and events are filed under.
///
/// `id` is derived from the repository URL or working-directory name and is
/// invariant-stable across processes on the same repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub display_name: String,
    #[serde(default)]
    pub settings: Value,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: ProjectId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            settings: Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_has_empty_object_settings() {
        let project = Project::new(ProjectId::from_source("/tmp/repo"), "repo");
        assert!(project.settings.is_object());
    }
}
