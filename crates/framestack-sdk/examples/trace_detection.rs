//! Trace detection example: a burst of tool calls gets bundled into a
//! single trace and classified by the shape of the sequence.
//!
//! This example demonstrates:
//! - Emitting a read/read/write/test/read tool-call sequence
//! - Flushing the run's in-progress trace
//! - The flushed trace being classified `error_recovery`

use framestack_sdk::types::{EventPayload, FrameType, ToolCallPayload, ToolResultPayload};
use framestack_sdk::ContextClient;
use serde_json::json;

async fn tool_call(
    run: &framestack_sdk::RunHandle,
    frame_id: framestack_sdk::types::FrameId,
    tool_name: &str,
    arguments: serde_json::Value,
    call_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    run.append_event(
        frame_id,
        EventPayload::ToolCall {
            call: ToolCallPayload {
                tool_name: tool_name.to_string(),
                arguments,
                call_id: call_id.to_string(),
            },
            extra: serde_json::Value::Null,
        },
    )
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== FrameStack SDK: Trace Detection ===\n");

    let dir = tempfile::tempdir()?;
    let client = ContextClient::connect(dir.path())?;
    client.register_project("trace-detection-example").await?;

    let run = client.start_run().await?;
    let root = run
        .create_root_frame(FrameType::Debug, "Fix flaky test", json!({}))
        .await?;

    tool_call(&run, root.id, "read", json!({"path": "a.rs"}), "call-1").await?;
    tool_call(&run, root.id, "read", json!({"path": "b.rs"}), "call-2").await?;
    tool_call(&run, root.id, "write", json!({"path": "a.rs"}), "call-3").await?;
    run.append_event(
        root.id,
        EventPayload::ToolResult {
            result: ToolResultPayload {
                call_id: "test-run".to_string(),
                success: false,
                result: None,
                error_message: Some("assertion failed: left == right".to_string()),
                duration_ms: 420,
            },
            extra: serde_json::Value::Null,
        },
    )
    .await?;
    tool_call(&run, root.id, "read", json!({"path": "a.rs"}), "call-4").await?;

    let trace = run.flush_trace().await?.expect("four tool calls should close into a trace");
    println!("trace length: {}", trace.len());
    println!("trace type: {:?}", trace.trace_type);
    println!("importance score: {:.3}", trace.importance);

    run.finish(framestack_sdk::types::RunState::Completed).await?;
    Ok(())
}
