//! Version-mismatch reaction tests.

use serde_json::json;

use inspector_bridge::adapter::{Adapter, SupportedVersionRange};
use inspector_bridge::environments::channel::ChannelEnvironment;

fn adapter_with(range: SupportedVersionRange) -> Adapter<ChannelEnvironment> {
    let (environment, _inbox) = ChannelEnvironment::new();
    Adapter::new(environment, range)
}

fn adapter() -> Adapter<ChannelEnvironment> {
    adapter_with(
        SupportedVersionRange::new("2.0.0", Some("3.0.0".to_owned()))
            .with_previous_versions(vec!["1.8.0".to_owned(), "1.9.0".to_owned()]),
    )
}

fn mismatch(version: &str) -> serde_json::Value {
    json!({ "name": "version-mismatch", "version": version })
}

#[test]
fn too_old_target_requests_newest_previous_version() {
    let adapter = adapter();
    adapter.dispatch_message(&mismatch("1.5.0"));
    assert_eq!(adapter.environment().mismatches(), vec!["1.9.0"]);
}

#[test]
fn target_at_till_bound_requests_till_version() {
    let adapter = adapter();
    adapter.dispatch_message(&mismatch("3.0.0"));
    assert_eq!(adapter.environment().mismatches(), vec!["3.0.0"]);
}

#[test]
fn target_past_till_bound_requests_till_version() {
    let adapter = adapter();
    adapter.dispatch_message(&mismatch("4.2.0-beta.1"));
    assert_eq!(adapter.environment().mismatches(), vec!["3.0.0"]);
}

#[test]
fn target_in_window_is_ignored() {
    let adapter = adapter();
    adapter.dispatch_message(&mismatch("2.5.0"));
    adapter.dispatch_message(&mismatch("2.0.0"));
    assert!(adapter.environment().mismatches().is_empty());
}

#[test]
fn each_mismatch_message_is_classified_once() {
    let adapter = adapter();
    adapter.dispatch_message(&mismatch("1.0.0"));
    adapter.dispatch_message(&mismatch("3.1.0"));
    assert_eq!(adapter.environment().mismatches(), vec!["1.9.0", "3.0.0"]);
}

#[test]
fn empty_previous_versions_takes_no_action() {
    let adapter = adapter_with(SupportedVersionRange::new("2.0.0", None));
    let report = adapter.dispatch_message(&mismatch("1.0.0"));
    assert!(report.is_clean());
    assert!(adapter.environment().mismatches().is_empty());
}

#[test]
fn malformed_target_version_takes_no_action() {
    let adapter = adapter();
    let report = adapter.dispatch_message(&mismatch("not-a-version"));
    assert!(report.is_clean());
    assert!(adapter.environment().mismatches().is_empty());
}

#[test]
fn other_messages_do_not_trigger_the_check() {
    let adapter = adapter();
    adapter.dispatch_message(&json!({ "name": "version-mismatch" }));
    adapter.dispatch_message(&json!({ "type": "version-mismatch", "version": "1.0.0" }));
    adapter.dispatch_message(&json!({ "name": "view-tree", "version": "1.0.0" }));
    assert!(adapter.environment().mismatches().is_empty());
}
