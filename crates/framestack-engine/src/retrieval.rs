//! Multi-strategy retrieval over closed frames (§4.5).

use chrono::{DateTime, Utc};

use framestack_core::tokenize;
use framestack_index::{queries, Database};
use framestack_providers::{cosine_similarity, EmbeddingOracle};
use framestack_types::{Frame, FrameType, ProjectId, QueryHit, Result};

const WEIGHT_NAME: f64 = 3.0;
const WEIGHT_DIGEST: f64 = 2.0;
const WEIGHT_TYPE: f64 = 1.5;
const WEIGHT_IO: f64 = 1.0;
const EXACT_PHRASE_BONUS: f64 = 0.5;

const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.2;
const DEFAULT_HYBRID_TEXT_WEIGHT: f64 = 0.5;
const DEFAULT_HYBRID_VEC_WEIGHT: f64 = 0.5;

const RECENCY_CAP: f64 = 0.2;
const CLOSED_DIGEST_BOOST: f64 = 0.1;
const NAME_MATCH_BOOST: f64 = 0.3;

/// Which scoring strategy produced a result set, echoed back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Keyword,
    Semantic,
    Hybrid,
    /// Total pipeline failure (storage down or deadline exceeded): empty
    /// results, reported so callers can detect degradation (§4.5, §5).
    Fallback,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Keyword => "keyword",
            Strategy::Semantic => "semantic",
            Strategy::Hybrid => "hybrid",
            Strategy::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub query: String,
    /// `None` lets the pipeline pick a strategy per §4.5's selection rule.
    pub strategy: Option<Strategy>,
    pub frame_types: Option<Vec<FrameType>>,
    /// Inclusive bounds on `Frame::created_at`. Unlike `frame_types`, a
    /// frame outside the range is excluded before scoring, not demoted.
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub min_score: f64,
    pub max_results: usize,
}

impl Default for RetrievalRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            strategy: None,
            frame_types: None,
            time_range: None,
            min_score: 0.0,
            max_results: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub hits: Vec<QueryHit>,
    pub strategy_used: Strategy,
    pub degraded_semantic: bool,
}

/// `retrieve(project, request) -> outcome`. Never returns an `Err` for
/// query-shape problems; storage failures and cancellation both collapse
/// to an empty [`Strategy::Fallback`] result (§4.5, §7).
pub async fn retrieve(
    db: &Database,
    oracle: &EmbeddingOracle,
    project_id: &ProjectId,
    request: &RetrievalRequest,
) -> Result<RetrievalOutcome> {
    if request.max_results == 0 {
        return Ok(RetrievalOutcome { hits: Vec::new(), strategy_used: Strategy::Keyword, degraded_semantic: false });
    }

    let candidates = match queries::frame::list_by_project(db.conn(), project_id.as_str()) {
        Ok(frames) => frames.into_iter().filter(|f| f.digest_text.is_some()).collect::<Vec<_>>(),
        Err(_) => {
            return Ok(RetrievalOutcome { hits: Vec::new(), strategy_used: Strategy::Fallback, degraded_semantic: false });
        }
    };

    let candidates: Vec<Frame> = match &request.frame_types {
        Some(types) => candidates.into_iter().filter(|f| types.contains(&f.frame_type)).collect(),
        None => candidates,
    };

    let candidates: Vec<Frame> = match request.time_range {
        Some((since, until)) => {
            candidates.into_iter().filter(|f| f.created_at >= since && f.created_at <= until).collect()
        }
        None => candidates,
    };

    if candidates.is_empty() || request.query.trim().is_empty() {
        return Ok(RetrievalOutcome { hits: Vec::new(), strategy_used: Strategy::Keyword, degraded_semantic: false });
    }

    let strategy = request.strategy.unwrap_or_else(|| select_strategy(&request.query));

    let (mut scored, degraded_semantic) = match strategy {
        Strategy::Keyword => (score_keyword(&request.query, &candidates), false),
        Strategy::Semantic => match score_semantic(oracle, &request.query, &candidates).await {
            Ok((scores, degraded)) => (scores, degraded),
            Err(_) => (score_keyword(&request.query, &candidates), true),
        },
        Strategy::Hybrid => {
            let text_scores = score_keyword(&request.query, &candidates);
            match score_semantic(oracle, &request.query, &candidates).await {
                Ok((vec_scores, degraded)) => (blend_hybrid(&text_scores, &vec_scores), degraded),
                Err(_) => (text_scores, true),
            }
        }
        Strategy::Fallback => (Vec::new(), false),
    };

    let effective_strategy = if degraded_semantic { Strategy::Keyword } else { strategy };
    apply_boosts_against_frames(&mut scored, &candidates, &request.query, Utc::now());

    let threshold = if matches!(effective_strategy, Strategy::Semantic) && !degraded_semantic {
        request.min_score.max(DEFAULT_SEMANTIC_THRESHOLD)
    } else {
        request.min_score
    };

    let mut hits: Vec<QueryHit> = candidates
        .iter()
        .zip(scored.iter())
        .filter(|(_, s)| s.combined >= threshold)
        .map(|(frame, s)| QueryHit {
            frame_id: frame.id,
            name: frame.name.clone(),
            digest_text: frame.digest_text.clone().unwrap_or_default(),
            score: s.combined,
            keyword_score: s.text,
            semantic_score: s.vector,
            recency_boost: s.recency_boost,
            flat_boost: s.flat_boost,
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.frame_id.cmp(&a.frame_id))
    });
    hits.truncate(request.max_results);

    Ok(RetrievalOutcome { hits, strategy_used: effective_strategy, degraded_semantic })
}

fn select_strategy(query: &str) -> Strategy {
    let tokens = tokenize(query);
    if tokens.len() <= 2 {
        Strategy::Keyword
    } else if tokens.len() >= 4 && query.chars().count() > 60 {
        Strategy::Semantic
    } else {
        Strategy::Hybrid
    }
}

struct RawScore {
    text: f64,
    vector: f64,
    combined: f64,
    recency_boost: f64,
    flat_boost: f64,
}

fn score_keyword(query: &str, candidates: &[Frame]) -> Vec<RawScore> {
    let query_tokens = tokenize(query);
    let exact_phrase = query.trim().to_lowercase();

    candidates
        .iter()
        .map(|frame| {
            let mut score = 0.0;
            score += field_match_score(&query_tokens, &frame.name) * WEIGHT_NAME;
            if let Some(digest) = &frame.digest_text {
                score += field_match_score(&query_tokens, digest) * WEIGHT_DIGEST;
            }
            score += field_match_score(&query_tokens, frame.frame_type.as_str()) * WEIGHT_TYPE;
            score += field_match_score(&query_tokens, &frame.inputs.to_string()) * WEIGHT_IO;
            if let Some(outputs) = &frame.outputs {
                score += field_match_score(&query_tokens, &outputs.to_string()) * WEIGHT_IO;
            }
            if !exact_phrase.is_empty() && frame.name.to_lowercase().contains(&exact_phrase) {
                score += EXACT_PHRASE_BONUS;
            }
            RawScore { text: score, vector: 0.0, combined: score, recency_boost: 1.0, flat_boost: 0.0 }
        })
        .collect()
}

fn field_match_score(query_tokens: &[String], field: &str) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let field_tokens = tokenize(field);
    if field_tokens.is_empty() {
        return 0.0;
    }
    let matches = query_tokens.iter().filter(|t| field_tokens.contains(t)).count();
    matches as f64 / query_tokens.len() as f64
}

/// Scores candidates against the query embedding, plus whether the oracle
/// itself fell back to a local encoding for this call (§4.4's hybrid
/// fallback) — distinct from a hard `Err`, and still `degraded_semantic`
/// from the caller's point of view.
async fn score_semantic(oracle: &EmbeddingOracle, query: &str, candidates: &[Frame]) -> Result<(Vec<RawScore>, bool)> {
    let outcome = oracle.embed(query).await?;
    let scores = candidates
        .iter()
        .map(|frame| {
            let similarity = match &frame.digest_embedding {
                Some(embedding) => cosine_similarity(&outcome.vector, embedding),
                None => 0.0,
            };
            RawScore { text: 0.0, vector: similarity, combined: similarity, recency_boost: 1.0, flat_boost: 0.0 }
        })
        .collect();
    Ok((scores, outcome.degraded))
}

fn blend_hybrid(text_scores: &[RawScore], vec_scores: &[RawScore]) -> Vec<RawScore> {
    let text_raw: Vec<f64> = text_scores.iter().map(|s| s.text).collect();
    let vec_raw: Vec<f64> = vec_scores.iter().map(|s| s.vector).collect();
    let text_norm = min_max_normalize(&text_raw);
    let vec_norm = min_max_normalize(&vec_raw);

    text_norm
        .into_iter()
        .zip(vec_norm)
        .map(|(t, v)| {
            let combined = DEFAULT_HYBRID_TEXT_WEIGHT * t + DEFAULT_HYBRID_VEC_WEIGHT * v;
            RawScore { text: t, vector: v, combined, recency_boost: 1.0, flat_boost: 0.0 }
        })
        .collect()
}

fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    if values.len() == 1 {
        return values.to_vec();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return values.iter().map(|_| 0.0).collect();
    }
    values.iter().map(|v| (v - min) / (max - min)).collect()
}

/// Applies the recency/closed/name-match boosts once frame metadata is
/// available, mutating `scores` in place.
fn apply_boosts_against_frames(scores: &mut [RawScore], candidates: &[Frame], query: &str, now: DateTime<Utc>) {
    let query_lower = query.trim().to_lowercase();
    for (score, frame) in scores.iter_mut().zip(candidates) {
        let age_hours = (now - frame.created_at).num_seconds().max(0) as f64 / 3600.0;
        let recency_boost = (1.0 + 0.2 * (-age_hours / 24.0).exp()).min(1.0 + RECENCY_CAP);
        score.recency_boost = recency_boost;

        let mut flat = 0.0;
        if frame.digest_text.is_some() && !frame.is_open() {
            flat += CLOSED_DIGEST_BOOST;
        }
        if !query_lower.is_empty() && frame.name.to_lowercase().contains(&query_lower) {
            flat += NAME_MATCH_BOOST;
        }
        score.flat_boost = flat;
        score.combined = (score.combined * recency_boost + flat).min(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestack_providers::EmbeddingOracle;
    use framestack_types::{Anchor, FrameType, Project, Run};
    use serde_json::Value;

    fn setup_with_frames(names: &[(&str, &str)]) -> (Database, ProjectId) {
        let mut db = Database::open_in_memory().unwrap();
        let project = Project::new(ProjectId::from_source("/tmp/retrieval-test"), "retrieval-test");
        queries::project::upsert(db.conn(), &project).unwrap();
        let run = Run::start(project.id.clone());
        queries::run::insert(db.conn(), &run).unwrap();
        for (name, digest) in names {
            let mut frame = Frame::new_root(run.id, FrameType::Task, *name, Value::Null);
            frame.close(Value::Null, digest.to_string(), Value::Null);
            queries::frame::insert(db.conn(), &frame).unwrap();
        }
        (db, project.id)
    }

    #[tokio::test]
    async fn keyword_retrieval_ranks_exact_phrase_match_higher() {
        let (db, project_id) = setup_with_frames(&[
            ("Fix login bug", "changed callback validation"),
            ("Refactor helper", "refactored shared helper"),
        ]);
        let oracle = EmbeddingOracle::local(64);
        let request = RetrievalRequest {
            query: "login bug".to_string(),
            strategy: Some(Strategy::Keyword),
            ..Default::default()
        };
        let outcome = retrieve(&db, &oracle, &project_id, &request).await.unwrap();
        assert_eq!(outcome.hits[0].name, "Fix login bug");
    }

    #[tokio::test]
    async fn max_results_zero_short_circuits_without_storage_calls() {
        let (db, project_id) = setup_with_frames(&[("Anything", "digest")]);
        let oracle = EmbeddingOracle::local(64);
        let request = RetrievalRequest { query: "anything".to_string(), max_results: 0, ..Default::default() };
        let outcome = retrieve(&db, &oracle, &project_id, &request).await.unwrap();
        assert!(outcome.hits.is_empty());
    }

    #[tokio::test]
    async fn empty_query_returns_empty_without_error() {
        let (db, project_id) = setup_with_frames(&[("Anything", "digest")]);
        let oracle = EmbeddingOracle::local(64);
        let request = RetrievalRequest { query: String::new(), ..Default::default() };
        let outcome = retrieve(&db, &oracle, &project_id, &request).await.unwrap();
        assert!(outcome.hits.is_empty());
    }

    #[test]
    fn min_max_normalize_handles_single_element_pool() {
        assert_eq!(min_max_normalize(&[0.42]), vec![0.42]);
    }

    #[tokio::test]
    async fn identical_snapshot_and_query_yield_identical_ordering() {
        let (db, project_id) = setup_with_frames(&[
            ("Fix login bug", "changed callback validation"),
            ("Refactor login helper", "refactored shared login helper"),
            ("Unrelated cleanup", "removed dead code"),
        ]);
        let oracle = EmbeddingOracle::local(64);
        let request = RetrievalRequest { query: "login bug".to_string(), ..Default::default() };

        let first = retrieve(&db, &oracle, &project_id, &request).await.unwrap();
        let second = retrieve(&db, &oracle, &project_id, &request).await.unwrap();

        let names = |outcome: &RetrievalOutcome| outcome.hits.iter().map(|h| (h.name.clone(), h.score)).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
    }

    #[tokio::test]
    async fn time_range_excludes_frames_outside_the_window() {
        let (db, project_id) = setup_with_frames(&[("Fix login bug", "changed callback validation")]);
        let oracle = EmbeddingOracle::local(64);
        let future_window = (Utc::now() + chrono::Duration::days(1), Utc::now() + chrono::Duration::days(2));
        let request = RetrievalRequest {
            query: "login bug".to_string(),
            time_range: Some(future_window),
            ..Default::default()
        };
        let outcome = retrieve(&db, &oracle, &project_id, &request).await.unwrap();
        assert!(outcome.hits.is_empty());
    }

    #[tokio::test]
    async fn hybrid_oracle_soft_fallback_flags_degraded_semantic() {
        let (db, project_id) = setup_with_frames(&[("Fix login bug", "changed callback validation")]);
        let oracle = EmbeddingOracle::hybrid(framestack_providers::unconfigured_remote(64), 64);
        let request = RetrievalRequest {
            query: "login bug".to_string(),
            strategy: Some(Strategy::Hybrid),
            ..Default::default()
        };
        let outcome = retrieve(&db, &oracle, &project_id, &request).await.unwrap();
        assert!(outcome.degraded_semantic);
        assert!(!outcome.hits.is_empty());
    }

    #[test]
    fn boosts_cap_combined_score_at_one() {
        let now = Utc::now();
        let project = Project::new(ProjectId::from_source("/tmp/boost-test"), "boost-test");
        let run = Run::start(project.id);
        let mut frame = Frame::new_root(run.id, FrameType::Task, "widget", Value::Null);
        frame.close(Value::Null, "digest".into(), Value::Null);
        let mut scores = vec![RawScore { text: 1.0, vector: 1.0, combined: 1.0, recency_boost: 1.0, flat_boost: 0.0 }];
        apply_boosts_against_frames(&mut scores, std::slice::from_ref(&frame), "widget", now);
        assert!(scores[0].combined <= 1.0);
        let _ = Anchor::new(frame.id, framestack_types::AnchorType::Fact, "x", 1);
    }
}
