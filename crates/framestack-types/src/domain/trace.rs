use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EventId, TraceId};

/// Classification assigned to a bounded group of tool-call events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceType {
    SearchDriven,
    ErrorRecovery,
    FeatureImplementation,
    Refactoring,
    Testing,
    Exploration,
    Debugging,
    Documentation,
    BuildDeploy,
    Unknown,
}

/// A bounded sequence of tool-call events grouped by the trace detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub id: TraceId,
    pub trace_type: TraceType,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    /// Weak references only: ids, no dangling lookup.
    pub events: Vec<EventId>,
    /// In `[0, 1]`.
    pub importance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
