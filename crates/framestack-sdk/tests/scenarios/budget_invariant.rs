//! A large corpus of closed frames never lets `assemble_context` exceed
//! its token budget, and still fits at least one relevant digest in.

use serde_json::json;

use framestack_testing::{fixtures, EngineWorld};
use framestack_types::{ContextDelta, Digest, FrameType, Intent};

#[tokio::test]
async fn assembly_over_a_large_corpus_stays_within_budget() {
    let world = EngineWorld::new().unwrap();
    let engine = world.engine();
    let run = world.start_run().unwrap();

    for (name, digest_result) in fixtures::retrieval_corpus_digests(1000, "connection timeout") {
        let frame = engine.create_frame(run.id, None, FrameType::Bug, name, json!({})).await.unwrap();
        engine
            .close_frame(run.id, frame.id, json!({}), Digest { result: digest_result, ..Default::default() })
            .await
            .unwrap();
    }

    let _root = engine.create_frame(run.id, None, FrameType::Debug, "connection timeout", json!({})).await.unwrap();
    let delta = ContextDelta { user_message: Some("connection timeout".to_string()), ..Default::default() };

    let bundle = engine.assemble_context(run.id, Intent::Debugging, 1000, delta).await.unwrap();

    assert!(bundle.usage.tokens_used <= 1000);
    assert!(!bundle.relevant_digests.is_empty());

    let scores: Vec<f64> = bundle.relevant_digests.iter().map(|d| d.score).collect();
    let mut sorted = scores.clone();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    assert_eq!(scores, sorted, "included digests must be a score-sorted prefix");
}
