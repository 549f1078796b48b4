use serde::{Deserialize, Serialize};

use crate::ids::{FrameId, RunId};

/// Structured filter extracted from a natural-language query by the intent
/// parser, or supplied directly by a caller that wants to skip parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_only: Option<bool>,
}

impl StructuredFilter {
    pub fn is_empty(&self) -> bool {
        self.frame_type.is_none()
            && self.run_id.is_none()
            && self.since.is_none()
            && self.until.is_none()
            && self.keywords.is_empty()
            && self.closed_only.is_none()
    }
}

/// A natural-language or structured retrieval request against frame memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub filter: StructuredFilter,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_frame: Option<FrameId>,
}

fn default_top_k() -> usize {
    10
}

/// One scored hit returned by the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHit {
    pub frame_id: FrameId,
    pub name: String,
    pub digest_text: String,
    pub score: f64,
    /// Component scores that summed (with boosts) into `score`, kept for
    /// callers that want to explain a ranking.
    pub keyword_score: f64,
    pub semantic_score: f64,
    pub recency_boost: f64,
    /// Sum of the flat closed-with-digest and name-substring boosts.
    pub flat_boost: f64,
}

/// The response to a [`QueryRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub hits: Vec<QueryHit>,
    pub parsed_filter: StructuredFilter,
    #[serde(default)]
    pub degraded_semantic: bool,
}
