//! Token-budgeted context assembly (§4.6).

use framestack_core::Clock;
use framestack_index::{queries, Database};
use framestack_providers::EmbeddingOracle;
use framestack_types::{
    Anchor, AnchorType, Bundle, ContextDelta, DegradationFlags, Event, EventPayload, Frame, HotStackEntry, Intent,
    Pointer, ProjectId, RelevantDigest, Result, RunId, Usage,
};

use crate::retrieval::{self, RetrievalRequest};
use crate::store::{anchor_index, event_log, frame_store};

/// Budget slices as fractions of the total token budget (§4.6 defaults).
const HOT_STACK_SHARE: f64 = 0.30;
const TEAM_FRAMES_SHARE: f64 = 0.20;
const RELEVANT_DIGESTS_SHARE: f64 = 0.30;
const PERSONAL_SHARE: f64 = 0.15;
// Remaining 5% is reserved for envelope/metadata and is never filled.

const RECENT_EVENTS_PER_FRAME: usize = 5;

/// Estimate token cost as `ceil(len/4)`, the default absent a precise
/// tokenizer (§4.6).
fn estimate_tokens(text: &str) -> u64 {
    ((text.len() as u64) + 3) / 4
}

/// `assemble(project, run, intent, token_budget, delta) -> bundle`.
///
/// Applies `delta` atomically with assembly: the caller's latest message
/// and tool events are appended to the log before the hot stack and
/// retrieval candidates are read, so assembly always sees them (§4.6).
pub async fn assemble(
    db: &mut Database,
    clock: &Clock,
    oracle: &EmbeddingOracle,
    project_id: &ProjectId,
    run_id: RunId,
    intent: Intent,
    token_budget: u64,
    delta: ContextDelta,
) -> Result<Bundle> {
    let mut flags = DegradationFlags::default();

    if !delta.is_empty() {
        apply_delta(db, clock, run_id, &delta)?;
    }

    let path = frame_store::active_path(db, run_id)?;
    let retrieval_query = derive_retrieval_query(db, &path, &delta)?;

    let hot_stack_budget = (token_budget as f64 * HOT_STACK_SHARE) as u64;
    let (hot_stack, hot_stack_tokens) = build_hot_stack(db, &path, hot_stack_budget)?;

    let anchors = consolidate_anchors(&hot_stack);

    let _ = intent; // intent shapes default slicing only; all intents share the same slices today.
    let team_frames_budget = (token_budget as f64 * TEAM_FRAMES_SHARE) as u64;
    let _ = team_frames_budget; // no multi-agent session sharing implemented yet; slice reserved but unfilled.

    let digests_budget = (token_budget as f64 * RELEVANT_DIGESTS_SHARE) as u64;
    let personal_budget = (token_budget as f64 * PERSONAL_SHARE) as u64;
    let digest_total_budget = digests_budget + personal_budget;

    let (relevant_digests, digest_tokens, degraded_semantic) = if retrieval_query.is_empty() {
        (Vec::new(), 0, false)
    } else {
        fill_relevant_digests(db, oracle, project_id, &retrieval_query, digest_total_budget).await?
    };
    flags.degraded_semantic = degraded_semantic;

    let pointers = collect_pointers(&hot_stack);

    let tokens_used = hot_stack_tokens + digest_tokens;
    Ok(Bundle {
        hot_stack,
        anchors,
        relevant_digests,
        pointers,
        usage: Usage { tokens_used, token_budget, sources_counted: 0 },
        flags,
    })
}

/// What the retrieval pipeline searches for: the caller's freshest message
/// if one came in on this turn, otherwise the leaf's most recent event
/// text, otherwise the leaf's goal name.
fn derive_retrieval_query(db: &Database, path: &[Frame], delta: &ContextDelta) -> Result<String> {
    if let Some(text) = &delta.user_message {
        return Ok(text.clone());
    }
    if let Some(text) = &delta.assistant_message {
        return Ok(text.clone());
    }
    let Some(leaf) = path.last() else { return Ok(String::new()) };
    let tail = event_log::tail(db, leaf.id, 1)?;
    match tail.first().map(|e| e.payload.as_text()).filter(|t| !t.is_empty()) {
        Some(text) => Ok(text),
        None => Ok(leaf.name.clone()),
    }
}

fn apply_delta(db: &mut Database, clock: &Clock, run_id: RunId, delta: &ContextDelta) -> Result<()> {
    let path = frame_store::active_path(db, run_id)?;
    let Some(leaf) = path.last() else { return Ok(()) };

    if let Some(text) = &delta.user_message {
        event_log::append(db, clock, leaf.id, EventPayload::UserMessage { text: text.clone(), extra: serde_json::Value::Null })?;
    }
    if let Some(text) = &delta.assistant_message {
        event_log::append(
            db,
            clock,
            leaf.id,
            EventPayload::AssistantMessage { text: text.clone(), extra: serde_json::Value::Null },
        )?;
    }
    for payload in &delta.tool_events {
        event_log::append(db, clock, leaf.id, payload.clone())?;
    }
    Ok(())
}

fn build_hot_stack(db: &Database, path: &[Frame], budget: u64) -> Result<(Vec<HotStackEntry>, u64)> {
    let mut entries = Vec::new();
    let mut tokens_used = 0u64;

    for frame in path {
        let anchors = anchor_index::list_live(db, frame.id, None, None)?;
        let constraints = anchors
            .iter()
            .filter(|a| a.anchor_type == AnchorType::Constraint)
            .map(|a| a.text.clone())
            .collect::<Vec<_>>();
        let definitions = anchors
            .iter()
            .filter(|a| a.anchor_type == AnchorType::Fact)
            .map(|a| a.text.clone())
            .collect::<Vec<_>>();
        let recent_events = event_log::tail(db, frame.id, RECENT_EVENTS_PER_FRAME)?;
        let active_artifacts = extract_artifact_refs(&recent_events);

        let entry = HotStackEntry {
            frame_id: frame.id,
            goal: frame.name.clone(),
            constraints,
            definitions,
            anchors,
            recent_events,
            active_artifacts,
        };

        let entry_tokens = estimate_hot_stack_entry_tokens(&entry);
        if tokens_used + entry_tokens > budget && !entries.is_empty() {
            break;
        }
        tokens_used += entry_tokens;
        entries.push(entry);
    }

    Ok((entries, tokens_used))
}

fn estimate_hot_stack_entry_tokens(entry: &HotStackEntry) -> u64 {
    let mut text = entry.goal.clone();
    for c in &entry.constraints {
        text.push(' ');
        text.push_str(c);
    }
    for d in &entry.definitions {
        text.push(' ');
        text.push_str(d);
    }
    for a in &entry.anchors {
        text.push(' ');
        text.push_str(&a.text);
    }
    for e in &entry.recent_events {
        text.push(' ');
        text.push_str(&e.payload.as_text());
    }
    estimate_tokens(&text)
}

fn extract_artifact_refs(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::Artifact { artifact, .. } => Some(artifact.reference.clone()),
            _ => None,
        })
        .collect()
}

/// Consolidate anchors across the hot stack, deduplicated by text (§6).
fn consolidate_anchors(hot_stack: &[HotStackEntry]) -> Vec<Anchor> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for entry in hot_stack {
        for anchor in &entry.anchors {
            if seen.insert(anchor.text.clone()) {
                out.push(anchor.clone());
            }
        }
    }
    out
}

async fn fill_relevant_digests(
    db: &Database,
    oracle: &EmbeddingOracle,
    project_id: &ProjectId,
    query: &str,
    budget: u64,
) -> Result<(Vec<RelevantDigest>, u64, bool)> {
    let request = RetrievalRequest { query: query.to_string(), max_results: 50, ..Default::default() };
    let outcome = retrieval::retrieve(db, oracle, project_id, &request).await?;

    let mut digests = Vec::new();
    let mut tokens_used = 0u64;
    for hit in &outcome.hits {
        let cost = estimate_tokens(&hit.digest_text) + estimate_tokens(&hit.name);
        if tokens_used + cost > budget {
            continue;
        }
        tokens_used += cost;
        digests.push(RelevantDigest {
            frame_id: hit.frame_id,
            name: hit.name.clone(),
            digest_text: hit.digest_text.clone(),
            score: hit.score,
            reason: format!("{} match", outcome.strategy_used.as_str()),
        });
    }

    Ok((digests, tokens_used, outcome.degraded_semantic))
}

fn collect_pointers(hot_stack: &[HotStackEntry]) -> Vec<Pointer> {
    hot_stack
        .iter()
        .flat_map(|entry| entry.active_artifacts.iter())
        .map(|reference| Pointer { uri: reference.clone(), description: "artifact referenced on the active path".into() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestack_types::{Digest, FrameType, Project};
    use serde_json::Value;

    async fn setup() -> (Database, EmbeddingOracle, ProjectId, RunId) {
        let mut db = Database::open_in_memory().unwrap();
        let project = Project::new(ProjectId::from_source("/tmp/assembler-test"), "assembler-test");
        queries::project::upsert(db.conn(), &project).unwrap();
        let run = framestack_types::Run::start(project.id.clone());
        frame_store::start_run(&mut db, &run).unwrap();
        (db, EmbeddingOracle::local(32), project.id, run.id)
    }

    #[tokio::test]
    async fn single_frame_session_has_one_hot_stack_entry_and_empty_digests() {
        let (mut db, oracle, project_id, run_id) = setup().await;
        let root = frame_store::create(&mut db, run_id, None, FrameType::Bug, "Fix login bug", Value::Null).unwrap();
        anchor_index::add(&mut db, root.id, AnchorType::Constraint, "Do not change callback URL shape", 8, None).unwrap();
        let clock = framestack_core::Clock::default();
        event_log::append(&mut db, &clock, root.id, EventPayload::UserMessage { text: "help".into(), extra: Value::Null }).unwrap();
        event_log::append(
            &mut db,
            &clock,
            root.id,
            EventPayload::ToolCall {
                call: framestack_types::ToolCallPayload { tool_name: "read".into(), arguments: Value::Null, call_id: "1".into() },
                extra: Value::Null,
            },
        )
        .unwrap();
        event_log::append(
            &mut db,
            &clock,
            root.id,
            EventPayload::ToolResult {
                result: framestack_types::ToolResultPayload {
                    call_id: "1".into(),
                    success: true,
                    result: None,
                    error_message: None,
                    duration_ms: 5,
                },
                extra: Value::Null,
            },
        )
        .unwrap();

        let bundle = assemble(&mut db, &clock, &oracle, &project_id, run_id, Intent::Debugging, 2000, ContextDelta::default())
            .await
            .unwrap();

        assert_eq!(bundle.hot_stack.len(), 1);
        assert!(bundle.anchors.iter().any(|a| a.anchor_type == AnchorType::Constraint));
        assert_eq!(bundle.hot_stack[0].recent_events.len(), 3);
        assert!(bundle.relevant_digests.is_empty());
        assert!(bundle.usage.tokens_used <= 2000);
    }

    #[tokio::test]
    async fn zero_budget_still_yields_a_well_formed_bundle() {
        let (mut db, oracle, project_id, run_id) = setup().await;
        frame_store::create(&mut db, run_id, None, FrameType::Task, "root", Value::Null).unwrap();
        let clock = framestack_core::Clock::default();
        let bundle = assemble(&mut db, &clock, &oracle, &project_id, run_id, Intent::Other, 0, ContextDelta::default()).await.unwrap();
        assert!(bundle.usage.tokens_used <= bundle.usage.token_budget || bundle.usage.token_budget == 0);
    }

    #[tokio::test]
    async fn nested_stack_ranks_closed_descendant_in_relevant_digests() {
        let (mut db, oracle, project_id, run_id) = setup().await;
        let a = frame_store::create(&mut db, run_id, None, FrameType::Task, "A", Value::Null).unwrap();
        let b = frame_store::create(&mut db, run_id, Some(a.id), FrameType::Subtask, "B", Value::Null).unwrap();
        let c = frame_store::create(&mut db, run_id, Some(b.id), FrameType::Subtask, "C", Value::Null).unwrap();
        frame_store::close(
            &mut db,
            c.id,
            Value::Null,
            Digest { result: "Refactored helper".into(), ..Default::default() },
            None,
        )
        .unwrap();

        let path = frame_store::active_path(&db, run_id).unwrap();
        assert_eq!(path.iter().map(|f| f.id).collect::<Vec<_>>(), vec![a.id, b.id]);

        let delta = ContextDelta { user_message: Some("refactored".into()), ..Default::default() };
        let clock = framestack_core::Clock::default();
        let bundle = assemble(&mut db, &clock, &oracle, &project_id, run_id, Intent::Coding, 2000, delta).await.unwrap();
        assert!(bundle.relevant_digests.iter().any(|d| d.frame_id == c.id && d.score > 0.0));
    }
}
