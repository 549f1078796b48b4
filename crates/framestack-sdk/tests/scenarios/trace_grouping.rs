//! A read/read/write/failed-test/read burst flushes into a single
//! `error_recovery` trace referencing all five events in order.

use serde_json::json;

use framestack_testing::fixtures;
use framestack_testing::EngineWorld;
use framestack_types::{EventPayload, FrameType, TraceType};

#[tokio::test]
async fn error_recovery_burst_flushes_into_one_trace() {
    let world = EngineWorld::new().unwrap();
    let engine = world.engine();
    let run = world.start_run().unwrap();

    let root = engine.create_frame(run.id, None, FrameType::Debug, "Fix flaky test", json!({})).await.unwrap();

    // Only tool-*call* ids end up as trace members (§3); the one
    // tool-result in the stream still drives error-recovery
    // classification but is never itself a trace reference.
    let mut call_event_ids = Vec::new();
    for (payload, _timestamp) in fixtures::error_recovery_tool_stream(chrono::Utc::now()) {
        let is_call = matches!(payload, EventPayload::ToolCall { .. });
        let event = engine.append_event(run.id, root.id, payload).await.unwrap();
        if is_call {
            call_event_ids.push(event.id);
        }
    }

    let trace = engine.flush_run_trace(run.id).await.unwrap().expect("a pending trace should flush");

    assert_eq!(trace.len(), 5);
    assert_eq!(trace.trace_type, TraceType::ErrorRecovery);
    assert!(trace.importance > 0.5);
    assert_eq!(trace.events, call_event_ids);
}
