//! Sample frame-tree and tool-call-stream builders.
//!
//! Mirrors the teacher's `SampleFiles` role (canned input a test can drop
//! in without hand-writing it inline) for this engine's own domain: frames,
//! anchors, events, and corpora of closed frames for retrieval tests.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use framestack_types::{EventPayload, ToolCallPayload, ToolResultPayload};

/// A `read(path)` tool-call event payload, timestamped `at`.
pub fn tool_call(tool_name: &str, args: Value, call_id: &str) -> EventPayload {
    EventPayload::ToolCall {
        call: ToolCallPayload { tool_name: tool_name.to_string(), arguments: args, call_id: call_id.to_string() },
        extra: Value::Null,
    }
}

pub fn tool_result(call_id: &str, success: bool, duration_ms: u64) -> EventPayload {
    EventPayload::ToolResult {
        result: ToolResultPayload {
            call_id: call_id.to_string(),
            success,
            result: None,
            error_message: if success { None } else { Some("failed".to_string()) },
            duration_ms,
        },
        extra: Value::Null,
    }
}

/// The "read two files, write one, test fails, re-read" sequence from
/// spec.md §8 scenario 4 (trace grouping / error recovery), as
/// `(payload, timestamp)` pairs starting at `base`.
pub fn error_recovery_tool_stream(base: DateTime<Utc>) -> Vec<(EventPayload, DateTime<Utc>)> {
    vec![
        (tool_call("read", json!({"path": "a.rs"}), "1"), base),
        (tool_call("read", json!({"path": "b.rs"}), "2"), base + Duration::milliseconds(100)),
        (tool_call("write", json!({"path": "a.rs"}), "3"), base + Duration::seconds(1)),
        (tool_call("test", json!({}), "4"), base + Duration::milliseconds(1050)),
        (tool_result("4", false, 5), base + Duration::milliseconds(1060)),
        (tool_call("read", json!({"path": "a.rs"}), "5"), base + Duration::milliseconds(1120)),
    ]
}

/// `n` distinct closed-frame digests for corpus-scale retrieval tests
/// (spec.md §8 scenario 6: "corpus of 1 000 frames with varying score").
/// Every other one mentions `needle` so ranking has something to separate
/// from the noise.
pub fn retrieval_corpus_digests(n: usize, needle: &str) -> Vec<(String, String)> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                (format!("{needle} task {i}"), format!("resolved {needle} in module {i}"))
            } else {
                (format!("unrelated task {i}"), format!("did unrelated work item {i}"))
            }
        })
        .collect()
}
