use framestack_types::*;
use serde_json::{json, Value};

#[test]
fn frame_close_transitions_to_closed_and_stops_accepting_new_digest() {
    let run = RunId::new();
    let mut root = Frame::new_root(run, FrameType::Task, "ship the thing", Value::Null);
    assert!(root.is_open());

    root.close(json!({"ok": true}), "shipped".to_string(), json!({"result": "shipped"}));
    assert!(!root.is_open());
    assert_eq!(root.digest_text.as_deref(), Some("shipped"));
    assert!(root.closed_at.is_some());
}

#[test]
fn nested_frames_track_depth_along_a_chain() {
    let run = RunId::new();
    let root = Frame::new_root(run, FrameType::Task, "root", Value::Null);
    let mid = Frame::new_child(&root, FrameType::Subtask, "mid", Value::Null);
    let leaf = Frame::new_child(&mid, FrameType::ToolScope, "leaf", Value::Null);

    assert_eq!(root.depth, 0);
    assert_eq!(mid.depth, 1);
    assert_eq!(leaf.depth, 2);
    assert_eq!(leaf.parent_id, Some(mid.id));
    assert_eq!(mid.run_id, root.run_id);
}

#[test]
fn anchor_order_key_sorts_priority_descending_then_creation_ascending() {
    let frame_id = FrameId::new();
    let low = Anchor::new(frame_id, AnchorType::Fact, "low priority", 2);
    let high = Anchor::new(frame_id, AnchorType::Decision, "high priority", 9);

    let mut anchors = vec![low.clone(), high.clone()];
    anchors.sort_by_key(anchor_order_key);

    assert_eq!(anchors[0].id, high.id);
    assert_eq!(anchors[1].id, low.id);
}

#[test]
fn anchor_priority_is_clamped_to_ten() {
    let anchor = Anchor::new(FrameId::new(), AnchorType::Risk, "capped", 255);
    assert_eq!(anchor.priority, 10);
}

#[test]
fn event_payload_round_trips_through_json_with_unknown_fields_preserved() {
    let raw = json!({
        "event_type": "user_message",
        "text": "hello",
        "future_field": "kept"
    });
    let payload: EventPayload = serde_json::from_value(raw).expect("deserializes");
    assert_eq!(payload.event_type(), EventType::UserMessage);
    assert_eq!(payload.as_text(), "hello");

    let back = serde_json::to_value(&payload).expect("serializes");
    assert_eq!(back["future_field"], json!("kept"));
}

#[test]
fn error_kind_display_matches_taxonomy_names() {
    let err = Error::not_found("frame missing").with_context("frame_id", "abc");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "NotFound: frame missing");
    assert_eq!(err.context().get("frame_id").map(String::as_str), Some("abc"));
}

#[test]
fn structured_filter_is_empty_by_default() {
    let filter = StructuredFilter::default();
    assert!(filter.is_empty());

    let populated = StructuredFilter {
        keywords: vec!["auth".to_string()],
        ..Default::default()
    };
    assert!(!populated.is_empty());
}
