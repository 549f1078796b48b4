//! Quickstart example: open a project, run a single-frame session, and
//! assemble context for it.
//!
//! This example demonstrates:
//! - Connecting to (and creating, on first use) a project's store
//! - Starting a run and creating its root frame
//! - Pinning a constraint anchor and appending events
//! - Assembling a token-budgeted context bundle

use framestack_sdk::types::{AnchorType, ContextDelta, EventPayload, FrameType, Intent};
use framestack_sdk::ContextClient;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== FrameStack SDK: Quickstart ===\n");

    let dir = tempfile::tempdir()?;
    let client = ContextClient::connect(dir.path())?;
    client.register_project("quickstart-example").await?;
    println!("✓ Project registered\n");

    let run = client.start_run().await?;
    let root = run
        .create_root_frame(FrameType::Bug, "Fix login bug", json!({}))
        .await?;
    println!("Created root frame: {} ({})", root.name, root.id);

    run.add_anchor(
        root.id,
        AnchorType::Constraint,
        "Do not change the callback URL shape",
        8,
        None,
    )
    .await?;

    run.append_event(
        root.id,
        EventPayload::UserMessage {
            text: "the login callback is redirecting twice".to_string(),
            extra: serde_json::Value::Null,
        },
    )
    .await?;

    let bundle = run
        .assemble_context(Intent::Debugging, 2000, ContextDelta::default())
        .await?;

    println!(
        "\nAssembled bundle: {} hot-stack entr{}, {} tokens of {} budget",
        bundle.hot_stack.len(),
        if bundle.hot_stack.len() == 1 { "y" } else { "ies" },
        bundle.usage.tokens_used,
        bundle.usage.token_budget,
    );
    for anchor in &bundle.anchors {
        println!("  anchor: [{:?}] {}", anchor.anchor_type, anchor.text);
    }

    run.finish(framestack_sdk::types::RunState::Completed).await?;
    Ok(())
}
