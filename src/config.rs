//! Configuration loading.
//!
//! Loads `config.toml` from `$INSPECTOR_BRIDGE_CONFIG` or
//! `~/.inspector-bridge/config.toml`. Every section has defaults, so a
//! missing or empty file is valid.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::adapter::SupportedVersionRange;
use crate::environments::stdio::{EditorCommand, FILE_PLACEHOLDER, LINE_PLACEHOLDER};
use crate::version::VersionTuple;

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "INSPECTOR_BRIDGE_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Supported target versions.
    pub versions: VersionsConfig,

    /// Stdio host settings.
    pub host: HostConfig,
}

/// The version window of this inspector build.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    /// `[from_version]` or `[from_version, till_version]`. An empty
    /// `till_version` means the window is open-ended.
    pub supported: Vec<String>,

    /// Versions supported by earlier inspector releases, oldest first.
    pub previous: Vec<String>,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            supported: vec![default_from_version()],
            previous: default_previous_versions(),
        }
    }
}

impl VersionsConfig {
    /// Validate and convert into the handshake's range.
    ///
    /// # Errors
    ///
    /// Returns an error if `supported` has no lower bound, more than two
    /// bounds, or any listed version does not parse.
    pub fn range(&self) -> anyhow::Result<SupportedVersionRange> {
        let (from, till) = match self.supported.as_slice() {
            [] => anyhow::bail!("versions.supported must name at least a lower bound"),
            [from] => (from, None),
            [from, till] if till.trim().is_empty() => (from, None),
            [from, till] => (from, Some(till.clone())),
            _ => anyhow::bail!(
                "versions.supported takes at most two entries, got {}",
                self.supported.len()
            ),
        };

        for version in std::iter::once(from)
            .chain(till.as_ref())
            .chain(self.previous.iter())
        {
            VersionTuple::parse(version)
                .with_context(|| format!("invalid version {version:?} in [versions]"))?;
        }

        Ok(SupportedVersionRange::new(from.clone(), till)
            .with_previous_versions(self.previous.clone()))
    }
}

/// Settings for the `host` subcommand.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Environment name reported by the adapter.
    pub name: String,

    /// Editor program used to open source locations.
    pub editor_command: Option<String>,

    /// Editor arguments; `{file}` and `{line}` are substituted.
    pub editor_args: Vec<String>,

    /// Directory for JSON log files. Stderr only when unset.
    pub logs_dir: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: default_host_name(),
            editor_command: None,
            editor_args: default_editor_args(),
            logs_dir: None,
        }
    }
}

impl HostConfig {
    /// The configured editor, if any.
    pub fn editor(&self) -> Option<EditorCommand> {
        self.editor_command
            .as_ref()
            .filter(|program| !program.trim().is_empty())
            .map(|program| EditorCommand::new(program.clone(), self.editor_args.clone()))
    }
}

impl Config {
    /// Parse a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }

    /// Apply environment overrides through `env` (a resolver, so tests need
    /// not touch the process environment).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("INSPECTOR_BRIDGE_FROM_VERSION") {
            match self.versions.supported.first_mut() {
                Some(from) => *from = v,
                None => self.versions.supported.push(v),
            }
        }
        if let Some(v) = env("INSPECTOR_BRIDGE_TILL_VERSION") {
            let from = self
                .versions
                .supported
                .first()
                .cloned()
                .unwrap_or_else(default_from_version);
            self.versions.supported = if v.trim().is_empty() {
                vec![from]
            } else {
                vec![from, v]
            };
        }
        if let Some(v) = env("INSPECTOR_BRIDGE_EDITOR") {
            self.host.editor_command = Some(v);
        }
    }
}

/// Load configuration from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    Config::from_toml(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

/// Load from `$INSPECTOR_BRIDGE_CONFIG` or the default location, then apply
/// environment overrides. A missing default file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed, or if
/// the home directory cannot be resolved.
pub fn load_default_config() -> anyhow::Result<Config> {
    let mut config = load_default_config_with(|key| std::env::var(key).ok())?;
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn load_default_config_with(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    if let Some(path) = env(CONFIG_PATH_ENV) {
        return load_config(Path::new(&path));
    }

    let path = config_dir()?.join("config.toml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            tracing::info!(path = %path.display(), "loading config from file");
            Config::from_toml(&contents)
                .with_context(|| format!("invalid config at {}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read config at {}: {e}", path.display())),
    }
}

/// Resolve the default config directory (`~/.inspector-bridge/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".inspector-bridge"))
}

// Default value functions for serde

fn default_from_version() -> String {
    "3.16.0".to_owned()
}
fn default_previous_versions() -> Vec<String> {
    vec!["0.0.0".to_owned(), "2.7.0".to_owned(), "3.4.0".to_owned()]
}
fn default_host_name() -> String {
    "stdio".to_owned()
}
fn default_editor_args() -> Vec<String> {
    vec![format!("{FILE_PLACEHOLDER}:{LINE_PLACEHOLDER}")]
}
