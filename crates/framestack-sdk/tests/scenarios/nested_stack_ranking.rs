//! Nested stack: a grandchild closes, its parent and grandparent stay
//! open, and the closed digest surfaces in `relevant_digests` ranked
//! ahead of an older closed frame with the same keyword score.

use serde_json::json;

use framestack_testing::EngineWorld;
use framestack_types::{ContextDelta, Digest, FrameType, Intent};

#[tokio::test]
async fn closed_descendant_outranks_an_older_equally_matching_digest() {
    let world = EngineWorld::new().unwrap();
    let engine = world.engine();
    let run = world.start_run().unwrap();

    let a = engine.create_frame(run.id, None, FrameType::Feature, "Add OAuth support", json!({})).await.unwrap();
    let b = engine.create_frame(run.id, Some(a.id), FrameType::Subtask, "Wire up token refresh", json!({})).await.unwrap();
    let c = engine.create_frame(run.id, Some(b.id), FrameType::ToolScope, "Extract refresh helper", json!({})).await.unwrap();

    // An older, already-closed frame with the same keyword match but no
    // recency advantage.
    let older = engine.create_frame(run.id, None, FrameType::Write, "refactored docs", json!({})).await.unwrap();
    engine
        .close_frame(run.id, older.id, json!({}), Digest { result: "refactored docs".to_string(), ..Default::default() })
        .await
        .unwrap();

    engine
        .close_frame(
            run.id,
            c.id,
            json!({"status": "done"}),
            Digest { result: "Refactored helper".to_string(), decisions: vec!["extracted refresh_token()".to_string()], ..Default::default() },
        )
        .await
        .unwrap();

    let active_path = engine.active_path(run.id).await.unwrap();
    assert_eq!(active_path.iter().map(|f| f.id).collect::<Vec<_>>(), vec![a.id, b.id]);

    let delta = ContextDelta { user_message: Some("refactored".to_string()), ..Default::default() };
    let bundle = engine.assemble_context(run.id, Intent::Coding, 4000, delta).await.unwrap();

    let c_rank = bundle.relevant_digests.iter().position(|d| d.frame_id == c.id);
    let older_rank = bundle.relevant_digests.iter().position(|d| d.frame_id == older.id);
    assert!(c_rank.is_some(), "closed descendant should appear among relevant digests");
    if let Some(older_rank) = older_rank {
        assert!(c_rank.unwrap() < older_rank, "the more recent closed frame should rank ahead");
    }
}
