//! Stashback: mirror local directory trees into an object store.
//!
//! # Usage
//!
//! ```text
//! stashback run  [--config <path>] [--root <dir>]... [--bucket <dir>] [--workers N]
//!                [--queue-capacity N] [--call-timeout-secs N] [--dry-run] [--json]
//!                [--report <path>]
//! stashback plan [--config <path>] [--root <dir>]... [--bucket <dir>]
//! ```
//!
//! Every flag except `--config`, `--json` and `--report` also reads a
//! `STASHBACK_*` environment variable; both lose to an explicit flag and win
//! over `~/.stashback/config.yaml`.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{plan::PlanArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stashback",
    version,
    about = "Back up local directories by reconciling them against a bucket",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Push new or changed files and remove objects that no longer exist locally.
    Run(RunArgs),

    /// Show the actions a run would take without executing any of them.
    Plan(PlanArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Run(args) => args.run().await,
            Commands::Plan(args) => args.run().await,
        }
    })
}

/// Diagnostics go to stderr so the report on stdout stays parseable.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
