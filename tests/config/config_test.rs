//! Coverage for config parsing, validation and overrides.

use std::collections::HashMap;
use std::path::PathBuf;

use inspector_bridge::config::{load_config, Config, HostConfig, VersionsConfig};

fn parse(toml_str: &str) -> Config {
    match Config::from_toml(toml_str) {
        Ok(config) => config,
        Err(err) => panic!("config should parse: {err:#}"),
    }
}

fn resolver(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn empty_config_uses_defaults() {
    let config = parse("");
    assert_eq!(config.versions.supported, vec!["3.16.0"]);
    assert_eq!(config.versions.previous, vec!["0.0.0", "2.7.0", "3.4.0"]);
    assert_eq!(config.host.name, "stdio");
    assert!(config.host.editor().is_none());
    assert!(config.host.logs_dir.is_none());
}

#[test]
fn parse_full_config() {
    let config = parse(
        r#"
[versions]
supported = ["2.0.0", "3.0.0"]
previous = ["1.8.0", "1.9.0"]

[host]
name = "devtools-pipe"
editor_command = "code"
editor_args = ["--goto", "{file}:{line}"]
logs_dir = "/tmp/inspector-logs"
"#,
    );

    let range = config.versions.range().expect("range should validate");
    assert_eq!(range.from_version, "2.0.0");
    assert_eq!(range.till_version.as_deref(), Some("3.0.0"));
    assert_eq!(range.previous_versions, vec!["1.8.0", "1.9.0"]);

    assert_eq!(config.host.name, "devtools-pipe");
    assert_eq!(
        config.host.logs_dir,
        Some(PathBuf::from("/tmp/inspector-logs"))
    );
    let editor = config.host.editor().expect("editor configured");
    assert_eq!(editor.program, "code");
    assert_eq!(editor.render_args("a.js", 9), vec!["--goto", "a.js:9"]);
}

#[test]
fn empty_till_version_means_open_ended() {
    let versions = VersionsConfig {
        supported: vec!["3.16.0".to_owned(), String::new()],
        previous: vec![],
    };
    let range = versions.range().expect("range should validate");
    assert_eq!(range.till_version, None);
}

#[test]
fn range_requires_a_lower_bound() {
    let versions = VersionsConfig {
        supported: vec![],
        previous: vec![],
    };
    assert!(versions.range().is_err());
}

#[test]
fn range_rejects_more_than_two_bounds() {
    let versions = VersionsConfig {
        supported: vec!["1.0.0".to_owned(), "2.0.0".to_owned(), "3.0.0".to_owned()],
        previous: vec![],
    };
    assert!(versions.range().is_err());
}

#[test]
fn range_rejects_malformed_versions() {
    let bad_bound = VersionsConfig {
        supported: vec!["two".to_owned()],
        previous: vec![],
    };
    assert!(bad_bound.range().is_err());

    let bad_previous = VersionsConfig {
        supported: vec!["2.0.0".to_owned()],
        previous: vec!["1.x".to_owned()],
    };
    let err = bad_previous.range().expect_err("previous version must parse");
    assert!(format!("{err:#}").contains("1.x"));
}

#[test]
fn env_overrides_replace_bounds_and_editor() {
    let mut config = parse("");
    config.apply_overrides(resolver(&[
        ("INSPECTOR_BRIDGE_FROM_VERSION", "2.0.0"),
        ("INSPECTOR_BRIDGE_TILL_VERSION", "4.0.0"),
        ("INSPECTOR_BRIDGE_EDITOR", "vim"),
    ]));
    assert_eq!(config.versions.supported, vec!["2.0.0", "4.0.0"]);
    assert_eq!(config.host.editor_command.as_deref(), Some("vim"));
}

#[test]
fn empty_till_override_clears_upper_bound() {
    let mut config = parse(
        r#"
[versions]
supported = ["2.0.0", "3.0.0"]
"#,
    );
    config.apply_overrides(resolver(&[("INSPECTOR_BRIDGE_TILL_VERSION", "")]));
    assert_eq!(config.versions.supported, vec!["2.0.0"]);
}

#[test]
fn overrides_without_vars_change_nothing() {
    let mut config = parse("");
    config.apply_overrides(resolver(&[]));
    assert_eq!(config.versions.supported, vec!["3.16.0"]);
    assert!(config.host.editor_command.is_none());
}

#[test]
fn blank_editor_command_is_ignored() {
    let host = HostConfig {
        editor_command: Some("  ".to_owned()),
        ..HostConfig::default()
    };
    assert!(host.editor().is_none());
}

#[test]
fn load_config_reads_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[versions]\nsupported = [\"1.0.0\"]\n").expect("write config");

    let config = load_config(&path).expect("config should load");
    assert_eq!(config.versions.supported, vec!["1.0.0"]);
}

#[test]
fn load_config_reports_invalid_toml() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[versions\n").expect("write config");

    let err = load_config(&path).expect_err("invalid TOML must fail");
    assert!(format!("{err:#}").contains("config.toml"));
}
