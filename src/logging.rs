//! Structured logging setup using `tracing-subscriber` and `tracing-appender`.
//!
//! Stdout carries the wire protocol, so no layer ever writes there:
//! - **Host** ([`init_production`]): JSON file layer (daily rotation) + stderr
//! - **CLI** ([`init_cli`]): stderr only

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log file prefix inside the logs directory.
pub const LOG_FILE_PREFIX: &str = "inspector-bridge.log";

/// Keeps the non-blocking file writer alive; dropping it flushes pending
/// entries.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialise host logging: JSON lines in
/// `{logs_dir}/inspector-bridge.log.YYYY-MM-DD` plus human-readable stderr,
/// both filtered by `RUST_LOG` (default `info`).
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created or a global
/// subscriber is already installed.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(json_layer)
        .with(console_layer)
        .try_init()
        .context("global tracing subscriber already installed")?;

    Ok(LoggingGuard { _guard: guard })
}

/// Initialise stderr-only logging for one-shot subcommands. A subscriber
/// installed earlier is left in place.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
