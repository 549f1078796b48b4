//! An always-failing remote oracle still yields usable, keyword-ranked
//! results instead of an error, with the degradation surfaced on the
//! response.

use serde_json::json;

use framestack_runtime::Config;
use framestack_testing::EngineWorld;
use framestack_types::{Digest, FrameType, QueryRequest};

#[tokio::test]
async fn hybrid_query_with_a_dead_remote_oracle_degrades_instead_of_failing() {
    // `remote` binds to the always-failing stub oracle; the retrieval
    // pipeline still picks `Strategy::Hybrid` for this query length, so
    // the semantic half of that blend is what fails here.
    let mut config = Config::default();
    config.embedding_provider = "remote".to_string();
    let world = EngineWorld::builder().with_config(config).build().unwrap();
    let engine = world.engine();
    let run = world.start_run().unwrap();

    let frame = engine
        .create_frame(run.id, None, FrameType::Bug, "database connection timeout", json!({}))
        .await
        .unwrap();
    engine
        .close_frame(
            run.id,
            frame.id,
            json!({}),
            Digest { result: "fixed a database connection timeout under load".to_string(), ..Default::default() },
        )
        .await
        .unwrap();

    let request = QueryRequest { text: Some("database connection timeout".to_string()), ..query_defaults() };
    let response = engine.query(&request).await.unwrap();

    assert!(response.degraded_semantic);
    assert!(!response.hits.is_empty());
}

fn query_defaults() -> QueryRequest {
    QueryRequest { text: None, filter: Default::default(), top_k: 10, scope_frame: None }
}
