//! Startup handshake tests.

use serde_json::json;

use inspector_bridge::adapter::{Adapter, SupportedVersionRange};
use inspector_bridge::environments::channel::ChannelEnvironment;

fn range() -> SupportedVersionRange {
    SupportedVersionRange::new("2.0.0", Some("3.0.0".to_owned()))
        .with_previous_versions(vec!["1.8.0".to_owned(), "1.9.0".to_owned()])
}

#[test]
fn construction_sends_exactly_one_check_version() {
    let (environment, mut inbox) = ChannelEnvironment::new();
    let _adapter = Adapter::new(environment, range());

    let first = inbox.try_recv().ok();
    assert_eq!(
        first,
        Some(json!({ "type": "check-version", "from": "devtools" }))
    );
    assert!(inbox.try_recv().is_err(), "only one message expected");
}

#[test]
fn listener_is_in_place_when_construction_returns() {
    let (environment, _inbox) = ChannelEnvironment::new();
    let adapter = Adapter::new(environment, range());

    assert_eq!(adapter.callback_count(), 1);

    // A reply to check-version is handled without any further setup.
    adapter.dispatch_message(&json!({ "name": "version-mismatch", "version": "1.5.0" }));
    assert_eq!(adapter.environment().mismatches(), vec!["1.9.0"]);
}

#[test]
fn handshake_runs_once_per_adapter() {
    let (environment, mut inbox) = ChannelEnvironment::new();
    let adapter = Adapter::new(environment, range());
    adapter.on_message_received(|_| Ok(()));
    adapter.dispatch_message(&json!({ "name": "ping" }));

    let mut check_versions = 0_usize;
    while let Ok(message) = inbox.try_recv() {
        if message.get("type").and_then(|t| t.as_str()) == Some("check-version") {
            check_versions = check_versions.saturating_add(1);
        }
    }
    assert_eq!(check_versions, 1);
}

#[test]
fn unanswered_check_leaves_no_mismatch() {
    let (environment, _inbox) = ChannelEnvironment::new();
    let adapter = Adapter::new(environment, range());
    assert_eq!(adapter.environment().needed_version(), None);
}
