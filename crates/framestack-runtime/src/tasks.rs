use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use framestack_types::{Error, Result, Task, TaskId};

/// Append-only projection of externally tracked tasks (spec.md §1: the
/// task lifecycle is owned by an external collaborator — a Linear/GitHub
/// synchronizer — and the engine only appends records and reprojects
/// current state by replaying the log).
#[derive(Debug, Clone)]
pub struct TaskLog {
    path: PathBuf,
}

impl TaskLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one task record. Nothing already written is ever rewritten;
    /// a later record for the same id simply supersedes the earlier one
    /// once [`TaskLog::project`] replays the log.
    pub fn append(&self, task: &Task) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::internal(e.to_string()))?;
        let line = serde_json::to_string(task).map_err(|e| Error::internal(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| Error::internal(e.to_string()))?;
        Ok(())
    }

    /// Replay the log into current-state-per-id, last write wins.
    pub fn project(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::internal(e.to_string()))?;
        let mut latest: HashMap<TaskId, Task> = HashMap::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let task: Task = serde_json::from_str(line).map_err(|e| Error::internal(e.to_string()))?;
            latest.insert(task.id, task);
        }
        Ok(latest.into_values().collect())
    }
}
