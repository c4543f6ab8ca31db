//! Inspector bridge CLI entry point.
//!
//! `compare` and `check` are one-shot version queries; `host` runs the
//! adapter over stdin/stdout until the target closes the pipe.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use inspector_bridge::adapter::{classify, Adapter, VersionDecision};
use inspector_bridge::config::{load_config, load_default_config, Config};
use inspector_bridge::environments::stdio::StdioEnvironment;
use inspector_bridge::version::compare_version;
use inspector_bridge::{logging, transport};

/// Environment adapter and version handshake for a debugging inspector.
#[derive(Parser)]
#[command(name = "inspector-bridge", version, about)]
struct Cli {
    /// Config file; defaults to `$INSPECTOR_BRIDGE_CONFIG` or
    /// `~/.inspector-bridge/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Compare two versions; prints `less`, `equal` or `greater`.
    Compare {
        /// Left-hand version.
        v1: String,
        /// Right-hand version.
        v2: String,
    },
    /// Classify a target version against the configured window.
    Check {
        /// Version reported by the target.
        version: String,
    },
    /// Run the adapter over stdin/stdout.
    Host,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Compare { v1, v2 } => handle_compare(&v1, &v2),
        Command::Check { version } => {
            logging::init_cli();
            let config = resolve_config(cli.config.as_ref())?;
            handle_check(&config, &version)
        }
        Command::Host => {
            let config = resolve_config(cli.config.as_ref())?;
            handle_host(config).await
        }
    }
}

fn resolve_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let mut config = load_config(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            Ok(config)
        }
        None => load_default_config().context("failed to load configuration"),
    }
}

fn handle_compare(v1: &str, v2: &str) -> anyhow::Result<()> {
    let ordering = compare_version(v1, v2)?;
    let label = match ordering {
        Ordering::Less => "less",
        Ordering::Equal => "equal",
        Ordering::Greater => "greater",
    };
    println!("{label}");
    Ok(())
}

fn handle_check(config: &Config, version: &str) -> anyhow::Result<()> {
    let range = config.versions.range()?;
    let decision = classify(version, &range)
        .with_context(|| format!("cannot classify target version {version:?}"))?;
    match decision {
        VersionDecision::Supported => println!("supported"),
        VersionDecision::Downgrade { needed_version } => println!("downgrade {needed_version}"),
        VersionDecision::Upgrade { needed_version } => println!("upgrade {needed_version}"),
        VersionDecision::Unresolvable => println!("unresolvable"),
    }
    Ok(())
}

/// Run the stdio host until stdin closes.
async fn handle_host(config: Config) -> anyhow::Result<()> {
    let _logging_guard = match &config.host.logs_dir {
        Some(dir) => Some(logging::init_production(dir)?),
        None => {
            logging::init_cli();
            None
        }
    };

    let range = config.versions.range()?;
    let (outbound, writer) = transport::spawn_writer(tokio::io::stdout());
    let environment = Arc::new(StdioEnvironment::new(
        config.host.name.clone(),
        outbound,
        config.host.editor(),
    ));

    info!(
        environment = %config.host.name,
        from_version = %range.from_version,
        till_version = ?range.till_version,
        "inspector bridge host started"
    );

    let adapter = Adapter::from_shared(Arc::clone(&environment), range);
    let stats = transport::pump(tokio::io::stdin(), &adapter)
        .await
        .context("inbound stream failed")?;

    let needed_version = environment.needed_version();
    // The writer stops once every sender is gone: the adapter's listener and
    // our own handle both hold one.
    drop(adapter);
    drop(environment);
    writer
        .await
        .context("stdout writer task panicked")?
        .context("failed to write to stdout")?;

    info!(
        messages = stats.messages,
        malformed = stats.malformed,
        callback_failures = stats.callback_failures,
        needed_version = ?needed_version,
        "inspector bridge host stopped"
    );
    if let Some(needed) = needed_version {
        eprintln!("needed inspector version: {needed}");
    }
    Ok(())
}
