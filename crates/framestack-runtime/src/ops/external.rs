use framestack_types::{Result, Task};

use crate::engine::Engine;

impl Engine {
    /// Write `bytes` into content-addressed artifact storage, returning
    /// the `artifact:<hash>` URI events reference it by.
    pub fn put_artifact(&self, bytes: &[u8]) -> Result<String> {
        self.0.artifacts.put(bytes)
    }

    pub fn get_artifact(&self, uri: &str) -> Result<Vec<u8>> {
        self.0.artifacts.get(uri)
    }

    /// Append one record to the external task log (§1, §10: tasks are
    /// owned by an external collaborator; the engine only appends and
    /// reprojects).
    pub fn append_task(&self, task: &Task) -> Result<()> {
        self.0.tasks.append(task)
    }

    /// Replay the task log into current-state-per-id.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.0.tasks.project()
    }
}
