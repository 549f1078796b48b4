//! The "standup for alice" whole-query template fills the last-24h window,
//! the named owner, and groups by frame, through the public client's
//! `parse_query` entry point.

use framestack_engine::GroupBy;
use framestack_sdk::ContextClient;

#[test]
fn standup_for_alice_resolves_to_a_daily_standup_template() {
    let dir = tempfile::tempdir().unwrap();
    let client = ContextClient::connect(dir.path()).unwrap();

    let parsed = client.parse_query("standup for alice");

    assert_eq!(parsed.interpreted.time_last.as_deref(), Some("24h"));
    assert!(parsed.interpreted.owners.contains(&"alice".to_string()));
    assert_eq!(parsed.interpreted.group_by, Some(GroupBy::Frame));
    assert!(parsed.validation_errors.is_empty());
}
