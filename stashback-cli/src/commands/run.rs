//! `stashback run`: one full backup pass.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stashback_core::{Overrides, ReportFormat};
use stashback_sync::{pipeline, RunOptions};

use super::{resolve, wire, SourceArgs};

/// Arguments for `stashback run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of concurrent workers.
    #[arg(long, value_name = "N", env = "STASHBACK_WORKERS")]
    pub workers: Option<usize>,

    /// Maximum number of queued actions.
    #[arg(long, value_name = "N", env = "STASHBACK_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Deadline for each remote put or remove, in seconds.
    #[arg(long, value_name = "SECS", env = "STASHBACK_CALL_TIMEOUT_SECS")]
    pub call_timeout_secs: Option<u64>,

    /// Compute and report actions without touching the bucket.
    #[arg(long, env = "STASHBACK_DRY_RUN")]
    pub dry_run: bool,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Write the report to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl RunArgs {
    pub async fn run(self) -> Result<()> {
        let file = self.source.config_file()?;
        let config = resolve(file, self.overrides())?;
        let (locals, remote) = wire(&config);
        let options = RunOptions::from(&config);

        let mut out: Box<dyn Write> = match &config.report_path {
            Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
                format!("failed to create report file '{}'", path.display())
            })?)),
            None => Box::new(io::stdout()),
        };

        let summary = pipeline::run(options, locals, remote, out.as_mut())
            .await
            .context("backup run failed")?;

        if summary.error_count > 0 {
            tracing::warn!(
                errors = summary.error_count,
                "some actions failed; see the report for details"
            );
        }
        Ok(())
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            call_timeout_secs: self.call_timeout_secs,
            dry_run: self.dry_run.then_some(true),
            report_path: self.report.clone(),
            report_format: self.json.then_some(ReportFormat::Json),
            ..self.source.overrides()
        }
    }
}
