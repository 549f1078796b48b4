use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, RunId};

/// Completion state of a [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Active,
    Completed,
    Failed,
}

/// One end-to-end session under a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub project_id: ProjectId,
    pub start_ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<DateTime<Utc>>,
    pub state: RunState,
}

impl Run {
    pub fn start(project_id: ProjectId) -> Self {
        Self {
            id: RunId::new(),
            project_id,
            start_ts: Utc::now(),
            end_ts: None,
            state: RunState::Active,
        }
    }

    pub fn finish(&mut self, state: RunState) {
        debug_assert!(state != RunState::Active, "finish requires a terminal state");
        self.state = state;
        self.end_ts = Some(Utc::now());
    }
}
