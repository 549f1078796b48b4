//! Nested frame stack example: a child frame closes while its ancestors
//! stay open, and a later query surfaces the closed digest ranked by
//! relevance.
//!
//! This example demonstrates:
//! - Building a multi-level frame stack (root -> child -> grandchild)
//! - Closing the deepest frame with a digest
//! - `active_path` reflecting only the still-open frames
//! - The closed frame's digest showing up in `relevant_digests`

use framestack_sdk::types::{ContextDelta, Digest, FrameType, Intent};
use framestack_sdk::ContextClient;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== FrameStack SDK: Nested Stack ===\n");

    let dir = tempfile::tempdir()?;
    let client = ContextClient::connect(dir.path())?;
    client.register_project("nested-stack-example").await?;

    let run = client.start_run().await?;
    let a = run
        .create_root_frame(FrameType::Feature, "Add OAuth support", json!({}))
        .await?;
    let b = run
        .create_frame(Some(a.id), FrameType::Subtask, "Wire up token refresh", json!({}))
        .await?;
    let c = run
        .create_frame(Some(b.id), FrameType::ToolScope, "Extract refresh helper", json!({}))
        .await?;

    run.close_frame(
        c.id,
        json!({"status": "done"}),
        Digest {
            result: "Refactored helper".to_string(),
            decisions: vec!["Extracted refresh_token() into its own module".to_string()],
            ..Default::default()
        },
    )
    .await?;

    let active_path = run.active_path().await?;
    println!(
        "active_path: {}",
        active_path.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(" -> ")
    );
    assert_eq!(active_path.len(), 2, "closed frame C should drop out of the active path");

    let bundle = run
        .assemble_context(Intent::Coding, 4000, ContextDelta::default())
        .await?;

    println!("\nrelevant_digests:");
    for digest in &bundle.relevant_digests {
        println!("  {} (score {:.3}): {}", digest.name, digest.score, digest.digest_text);
    }

    run.finish(framestack_sdk::types::RunState::Completed).await?;
    Ok(())
}
