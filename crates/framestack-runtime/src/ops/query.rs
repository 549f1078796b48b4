use framestack_engine::cache::fingerprint;
use framestack_engine::{parse_intent_query, retrieve, ParsedQuery, RetrievalOutcome, RetrievalRequest, Strategy};
use framestack_types::{FrameType, QueryRequest, QueryResponse, Result};

use crate::engine::Engine;

fn parse_frame_type(s: &str) -> Option<FrameType> {
    Some(match s {
        "task" => FrameType::Task,
        "subtask" => FrameType::Subtask,
        "tool_scope" => FrameType::ToolScope,
        "review" => FrameType::Review,
        "write" => FrameType::Write,
        "debug" => FrameType::Debug,
        "feature" => FrameType::Feature,
        "bug" => FrameType::Bug,
        "refactor" => FrameType::Refactor,
        "architecture" => FrameType::Architecture,
        "milestone" => FrameType::Milestone,
        _ => return None,
    })
}

impl Engine {
    /// Parse a free-text query into its structured interpretation (§4.8).
    /// Pure and synchronous — no storage access.
    pub fn parse_query(&self, text: &str) -> ParsedQuery {
        parse_intent_query(text)
    }

    /// `query(request) -> response` (§4.5, §4.9). Results are cached by a
    /// fingerprint of the query shape and invalidated whenever a write
    /// bumps the cache watermark, so a cached hit can never outlive the
    /// state it was computed against.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let query_text = request.text.clone().unwrap_or_default();
        let frame_types = request.filter.frame_type.as_deref().and_then(parse_frame_type).map(|t| vec![t]);
        let time_range = match (request.filter.since, request.filter.until) {
            (Some(since), Some(until)) => Some((since, until)),
            (Some(since), None) => Some((since, chrono::Utc::now())),
            (None, Some(until)) => Some((chrono::DateTime::<chrono::Utc>::MIN_UTC, until)),
            (None, None) => None,
        };
        let key = fingerprint(&[
            self.0.project_id.as_str(),
            &query_text,
            &request.filter.frame_type.clone().unwrap_or_default(),
            &request.filter.since.map(|t| t.to_rfc3339()).unwrap_or_default(),
            &request.filter.until.map(|t| t.to_rfc3339()).unwrap_or_default(),
            &request.top_k.to_string(),
        ]);

        if let Some(outcome) = self.0.cache.get(&key) {
            return Ok(build_response(outcome, request));
        }

        let retrieval_request = RetrievalRequest {
            query: query_text.clone(),
            strategy: None,
            frame_types,
            time_range,
            min_score: 0.0,
            max_results: request.top_k,
        };

        let _permit = self.acquire_oracle_permit().await;
        let db = self.0.db.lock().await;
        let outcome = self
            .0
            .cache
            .get_or_compute(&key, query_text.len() as u64, || async {
                retrieve(&db, &self.0.oracle, &self.0.project_id, &retrieval_request)
                    .await
                    .unwrap_or_else(|_| RetrievalOutcome {
                        hits: Vec::new(),
                        strategy_used: Strategy::Fallback,
                        degraded_semantic: false,
                    })
            })
            .await;

        Ok(build_response(outcome, request))
    }
}

fn build_response(outcome: RetrievalOutcome, request: &QueryRequest) -> QueryResponse {
    QueryResponse {
        hits: outcome.hits,
        parsed_filter: request.filter.clone(),
        degraded_semantic: outcome.degraded_semantic,
    }
}
