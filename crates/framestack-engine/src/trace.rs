//! Tool-call trace bundling, classification, and scoring (§4.7).

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use framestack_types::{Event, EventId, EventPayload, Trace, TraceType};

pub const DEFAULT_TRACE_GAP_SECONDS: i64 = 30;
pub const DEFAULT_TRACE_MAX_LEN: usize = 64;
pub const DEFAULT_COMPRESS_AGE_HOURS: i64 = 24;

const RECOVERY_TOOLS: &[&str] = &["read", "re_read", "test", "retest"];

#[derive(Debug, Clone, Copy)]
pub struct TraceConfig {
    pub gap: ChronoDuration,
    pub max_len: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self { gap: ChronoDuration::seconds(DEFAULT_TRACE_GAP_SECONDS), max_len: DEFAULT_TRACE_MAX_LEN }
    }
}

/// Incrementally folds a tool-call/tool-result event stream into bounded
/// traces. A trace's emitted `events` list holds tool-*call* references
/// only (§3: "list of tool-call references"); tool-result events still
/// drive idle-gap timing and error-recovery classification but are never
/// themselves members of the trace. Closing is idempotent: `flush` on an
/// already-empty builder is a no-op.
pub struct TraceBuilder {
    config: TraceConfig,
    current: Vec<Event>,
    last_activity_at: Option<DateTime<Utc>>,
    had_error: bool,
}

impl TraceBuilder {
    pub fn new(config: TraceConfig) -> Self {
        Self { config, current: Vec::new(), last_activity_at: None, had_error: false }
    }

    /// Feed one event. Returns a closed [`Trace`] if this event forced the
    /// in-progress trace shut (idle gap exceeded, or length cap hit after
    /// accepting this event).
    pub fn push(&mut self, event: Event) -> Option<Trace> {
        let is_tool_event = matches!(event.payload, EventPayload::ToolCall { .. } | EventPayload::ToolResult { .. });
        if !is_tool_event {
            return None;
        }

        let mut closed = None;
        if let Some(last) = self.last_activity_at {
            if event.timestamp - last > self.config.gap {
                closed = self.flush();
            }
        }
        self.last_activity_at = Some(event.timestamp);

        let is_call = matches!(event.payload, EventPayload::ToolCall { .. });
        if let EventPayload::ToolResult { result, .. } = &event.payload {
            if !result.success {
                self.had_error = true;
            }
        }
        if is_call {
            self.current.push(event);
        }

        if self.current.len() >= self.config.max_len {
            let flushed = self.flush();
            return flushed.or(closed);
        }
        closed
    }

    /// Close the in-progress trace, if any.
    pub fn flush(&mut self) -> Option<Trace> {
        if self.current.is_empty() {
            return None;
        }
        let events = std::mem::take(&mut self.current);
        let had_error = self.had_error;
        self.last_activity_at = None;
        self.had_error = false;
        Some(build_trace(events, had_error))
    }
}

fn build_trace(events: Vec<Event>, had_error: bool) -> Trace {
    let start_ts = events.first().map(|e| e.timestamp).unwrap_or_else(Utc::now);
    let end_ts = events.last().map(|e| e.timestamp).unwrap_or(start_ts);
    let trace_type = classify(&events, had_error);
    let importance = score_importance(&events, trace_type);
    let event_ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
    let summary = Some(summarize(&events, trace_type));

    Trace { id: Default::default(), trace_type, start_ts, end_ts, events: event_ids, importance, summary }
}

fn tool_name(event: &Event) -> Option<&str> {
    match &event.payload {
        EventPayload::ToolCall { call, .. } => Some(call.tool_name.as_str()),
        _ => None,
    }
}

/// Derives a coarse class from the tool-name sequence. `error_recovery`
/// takes precedence when an error is followed by a recognized recovery
/// tool, since that pattern crosses the other canonical classes.
fn classify(events: &[Event], had_error: bool) -> TraceType {
    let names: Vec<&str> = events.iter().filter_map(tool_name).collect();

    if had_error && names.iter().any(|n| RECOVERY_TOOLS.contains(n)) {
        return TraceType::ErrorRecovery;
    }
    if names.iter().any(|n| is_build_tool(n)) {
        return TraceType::BuildDeploy;
    }
    if names.iter().any(|n| is_test_tool(n)) {
        return TraceType::Testing;
    }
    if names.iter().any(|n| is_write_tool(n)) {
        return TraceType::FeatureImplementation;
    }
    if !names.is_empty() && names.iter().all(|n| is_search_tool(n)) {
        return TraceType::SearchDriven;
    }
    if !names.is_empty() && names.iter().all(|n| is_read_tool(n)) {
        return TraceType::Exploration;
    }
    TraceType::Unknown
}

fn is_search_tool(name: &str) -> bool {
    matches!(name, "grep" | "glob" | "search" | "find")
}
fn is_read_tool(name: &str) -> bool {
    matches!(name, "read" | "re_read" | "cat")
}
fn is_write_tool(name: &str) -> bool {
    matches!(name, "write" | "edit" | "patch")
}
fn is_test_tool(name: &str) -> bool {
    matches!(name, "test" | "retest")
}
fn is_build_tool(name: &str) -> bool {
    matches!(name, "build" | "compile")
}

/// Weighted blend of length, error-recovery presence, file-modification
/// breadth, and decision-event colocation, in `[0, 1]` and deterministic
/// for a given event sequence.
fn score_importance(events: &[Event], trace_type: TraceType) -> f64 {
    let length_component = (events.len() as f64 / DEFAULT_TRACE_MAX_LEN as f64).min(1.0);
    let recovery_component = if trace_type == TraceType::ErrorRecovery { 1.0 } else { 0.0 };

    let modified_files: std::collections::HashSet<String> = events
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::ToolCall { call, .. } if is_write_tool(&call.tool_name) => {
                call.arguments.get("path").and_then(|v| v.as_str()).map(|s| s.to_string())
            }
            _ => None,
        })
        .collect();
    let breadth_component = (modified_files.len() as f64 / 5.0).min(1.0);

    let decision_component = 0.0; // decision events live on the frame log, not the tool-call stream this builder sees.

    0.3 * length_component + 0.5 * recovery_component + 0.15 * breadth_component + 0.05 * decision_component
}

fn summarize(events: &[Event], trace_type: TraceType) -> String {
    let tools: Vec<&str> = events.iter().filter_map(tool_name).collect();
    format!("{:?} trace over {} event(s): {}", trace_type, events.len(), tools.join(" -> "))
}

/// Replace an aged-out trace's full event payload with an extractive
/// summary retaining id, type, score, and first/last event references. The
/// underlying events are never deleted from the log; this is purely a
/// retrieval hint (§4.7).
pub fn compress_if_aged(trace: &Trace, now: DateTime<Utc>, compress_age_hours: i64) -> Option<Trace> {
    if now - trace.end_ts < ChronoDuration::hours(compress_age_hours) {
        return None;
    }
    let endpoints: Vec<EventId> = match (trace.events.first(), trace.events.last()) {
        (Some(first), Some(last)) if first == last => vec![*first],
        (Some(first), Some(last)) => vec![*first, *last],
        _ => Vec::new(),
    };
    Some(Trace {
        id: trace.id,
        trace_type: trace.trace_type,
        start_ts: trace.start_ts,
        end_ts: trace.end_ts,
        events: endpoints,
        importance: trace.importance,
        summary: trace.summary.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestack_types::{EventPosition, FrameId, ToolCallPayload, ToolResultPayload};
    use serde_json::json;

    fn tool_call_event(frame_id: FrameId, seq: u64, at: DateTime<Utc>, tool: &str, args: serde_json::Value) -> Event {
        Event {
            id: EventId::new(),
            frame_id,
            position: EventPosition { seq, shard: 0 },
            payload: EventPayload::ToolCall {
                call: ToolCallPayload { tool_name: tool.into(), arguments: args, call_id: seq.to_string() },
                extra: serde_json::Value::Null,
            },
            timestamp: at,
        }
    }

    fn tool_result_event(frame_id: FrameId, seq: u64, at: DateTime<Utc>, call_id: &str, success: bool) -> Event {
        Event {
            id: EventId::new(),
            frame_id,
            position: EventPosition { seq, shard: 0 },
            payload: EventPayload::ToolResult {
                result: ToolResultPayload {
                    call_id: call_id.into(),
                    success,
                    result: None,
                    error_message: if success { None } else { Some("failed".into()) },
                    duration_ms: 1,
                },
                extra: serde_json::Value::Null,
            },
            timestamp: at,
        }
    }

    #[test]
    fn trace_grouping_closes_on_idle_gap_and_classifies_error_recovery() {
        let frame_id = FrameId::new();
        let t0 = Utc::now();
        let mut builder = TraceBuilder::new(TraceConfig::default());

        assert!(builder.push(tool_call_event(frame_id, 0, t0, "read", json!({"path": "a.rs"}))).is_none());
        assert!(builder.push(tool_call_event(frame_id, 1, t0 + ChronoDuration::milliseconds(100), "read", json!({"path": "b.rs"}))).is_none());
        let t1 = t0 + ChronoDuration::seconds(1);
        assert!(builder.push(tool_call_event(frame_id, 2, t1, "write", json!({"path": "a.rs"}))).is_none());
        assert!(builder.push(tool_call_event(frame_id, 3, t1 + ChronoDuration::milliseconds(50), "test", json!({}))).is_none());
        assert!(builder.push(tool_result_event(frame_id, 4, t1 + ChronoDuration::milliseconds(60), "3", false)).is_none());
        assert!(builder.push(tool_call_event(frame_id, 5, t1 + ChronoDuration::milliseconds(120), "read", json!({"path": "a.rs"}))).is_none());

        let trace = builder.flush().expect("trace should close on flush");
        assert_eq!(trace.events.len(), 5);
        assert_eq!(trace.trace_type, TraceType::ErrorRecovery);
        assert!(trace.importance > 0.5);
    }

    #[test]
    fn idle_gap_past_threshold_force_closes_the_trace() {
        let frame_id = FrameId::new();
        let t0 = Utc::now();
        let mut builder = TraceBuilder::new(TraceConfig::default());
        builder.push(tool_call_event(frame_id, 0, t0, "read", json!({"path": "a.rs"})));
        let closed = builder.push(tool_call_event(
            frame_id,
            1,
            t0 + ChronoDuration::seconds(DEFAULT_TRACE_GAP_SECONDS + 1),
            "read",
            json!({"path": "b.rs"}),
        ));
        assert!(closed.is_some());
        assert_eq!(closed.unwrap().events.len(), 1);
    }

    #[test]
    fn non_tool_events_are_ignored() {
        let frame_id = FrameId::new();
        let mut builder = TraceBuilder::new(TraceConfig::default());
        let event = Event {
            id: EventId::new(),
            frame_id,
            position: EventPosition { seq: 0, shard: 0 },
            payload: EventPayload::Decision { text: "use postgres".into(), extra: serde_json::Value::Null },
            timestamp: Utc::now(),
        };
        assert!(builder.push(event).is_none());
        assert!(builder.flush().is_none());
    }

    #[test]
    fn compress_if_aged_retains_only_endpoint_events() {
        let frame_id = FrameId::new();
        let t0 = Utc::now() - ChronoDuration::hours(48);
        let trace = Trace {
            id: Default::default(),
            trace_type: TraceType::Exploration,
            start_ts: t0,
            end_ts: t0,
            events: vec![EventId::new(), EventId::new(), EventId::new()],
            importance: 0.4,
            summary: Some("read trace".into()),
        };
        let _ = frame_id;
        let compressed = compress_if_aged(&trace, Utc::now(), DEFAULT_COMPRESS_AGE_HOURS).unwrap();
        assert_eq!(compressed.events.len(), 2);
    }

    #[test]
    fn compress_if_aged_does_not_duplicate_a_single_event_trace() {
        let t0 = Utc::now() - ChronoDuration::hours(48);
        let only_event = EventId::new();
        let trace = Trace {
            id: Default::default(),
            trace_type: TraceType::Exploration,
            start_ts: t0,
            end_ts: t0,
            events: vec![only_event],
            importance: 0.1,
            summary: Some("single read".into()),
        };
        let compressed = compress_if_aged(&trace, Utc::now(), DEFAULT_COMPRESS_AGE_HOURS).unwrap();
        assert_eq!(compressed.events, vec![only_event]);
    }

    #[test]
    fn compress_if_aged_is_none_for_recent_traces() {
        let trace = Trace {
            id: Default::default(),
            trace_type: TraceType::Exploration,
            start_ts: Utc::now(),
            end_ts: Utc::now(),
            events: vec![EventId::new()],
            importance: 0.1,
            summary: Some("fresh".into()),
        };
        assert!(compress_if_aged(&trace, Utc::now(), DEFAULT_COMPRESS_AGE_HOURS).is_none());
    }
}
