use std::path::{Path, PathBuf};

use framestack_types::Result;

use crate::error::io_error;

/// The on-disk layout under a project root (spec.md §6):
///
/// ```text
/// <project_root>/.data/
///   context.db        # frames, anchors, digests, embeddings
///   events/<shard>    # reserved for a future sharded-file event backend
///   artifacts/        # opaque blobs referenced from events (content-addressed)
///   tasks.jsonl       # append-only external-task log (collaborator-owned)
///   sync.db           # sync state (collaborator-owned)
/// ```
///
/// `framestack-index::Database` stores every frame/event/anchor/trace row in
/// `context.db` regardless of `event_log_shards` (sharding is expressed as a
/// column, not as separate files — see `framestack-core::Clock`); `events/`
/// is still created so external tooling that expects the directory to exist
/// (and a future file-per-shard backend) has somewhere to land.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self { root: project_root.into() }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(".data")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("context.db")
    }

    pub fn events_dir(&self) -> PathBuf {
        self.data_dir().join("events")
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.data_dir().join("artifacts")
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir().join("tasks.jsonl")
    }

    pub fn sync_db_path(&self) -> PathBuf {
        self.data_dir().join("sync.db")
    }

    /// Create every directory this layout names. `context.db`, `tasks.jsonl`
    /// and `sync.db` are left for their owning components to create lazily.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.data_dir(), self.events_dir(), self.artifacts_dir()] {
            std::fs::create_dir_all(&dir).map_err(io_error)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ensure_directories_creates_data_events_and_artifacts() {
        let dir = TempDir::new().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.ensure_directories().unwrap();
        assert!(layout.data_dir().is_dir());
        assert!(layout.events_dir().is_dir());
        assert!(layout.artifacts_dir().is_dir());
    }

    #[test]
    fn db_path_and_tasks_path_are_under_data_dir() {
        let layout = ProjectLayout::new("/repo");
        assert_eq!(layout.db_path(), PathBuf::from("/repo/.data/context.db"));
        assert_eq!(layout.tasks_path(), PathBuf::from("/repo/.data/tasks.jsonl"));
    }
}
