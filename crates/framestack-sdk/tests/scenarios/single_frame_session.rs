//! A session that never branches: one root frame, one constraint anchor,
//! a short event stream, assembled once.

use serde_json::json;

use framestack_testing::EngineWorld;
use framestack_types::{AnchorType, ContextDelta, EventPayload, FrameType, Intent};

#[tokio::test]
async fn single_frame_session_assembles_within_budget() {
    let world = EngineWorld::new().unwrap();
    let engine = world.engine();
    let run = world.start_run().unwrap();

    let root = engine
        .create_frame(run.id, None, FrameType::Bug, "Fix login bug", json!({}))
        .await
        .unwrap();

    engine
        .add_anchor(root.id, AnchorType::Constraint, "Do not change the callback URL shape", 8, None)
        .await
        .unwrap();

    engine
        .append_event(run.id, root.id, EventPayload::UserMessage { text: "users see a double redirect".into(), extra: serde_json::Value::Null })
        .await
        .unwrap();
    engine
        .append_event(
            run.id,
            root.id,
            EventPayload::ToolCall {
                call: framestack_types::ToolCallPayload {
                    tool_name: "grep".into(),
                    arguments: json!({"pattern": "callback_url"}),
                    call_id: "1".into(),
                },
                extra: serde_json::Value::Null,
            },
        )
        .await
        .unwrap();
    engine
        .append_event(
            run.id,
            root.id,
            EventPayload::ToolResult {
                result: framestack_types::ToolResultPayload {
                    call_id: "1".into(),
                    success: true,
                    result: Some(json!({"matches": 3})),
                    error_message: None,
                    duration_ms: 12,
                },
                extra: serde_json::Value::Null,
            },
        )
        .await
        .unwrap();

    let bundle = engine.assemble_context(run.id, Intent::Debugging, 2000, ContextDelta::default()).await.unwrap();

    assert_eq!(bundle.hot_stack.len(), 1);
    assert!(bundle.anchors.iter().any(|a| a.anchor_type == AnchorType::Constraint));
    assert_eq!(bundle.hot_stack[0].recent_events.len(), 3);
    assert!(bundle.relevant_digests.is_empty());
    assert!(bundle.usage.tokens_used <= 2000);
}
