//! End-of-run reports.
//!
//! Two shapes share the [`Report`] contract: [`RunReport`] keeps every entry
//! and prints a per-file section, [`DryRunReport`] only counts. Text output
//! is prefixed per line with `REPORT: <UTC timestamp> `.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;

use stashback_core::{ActionType, LogEntry, ReportFormat};

const RULE: &str = "-------------------------------";

/// Aggregate numbers for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_processed: usize,
    pub push_count: usize,
    pub remove_count: usize,
    pub error_count: usize,
    pub elapsed_ms: u128,
    pub dry_run: bool,
}

/// Accumulates log entries and renders them once the run is over.
pub trait Report: Send {
    fn record(&mut self, entry: LogEntry);

    fn summary(&self) -> RunSummary;

    fn write_text(&self, out: &mut dyn Write) -> io::Result<()>;

    fn write_json(&self, out: &mut dyn Write) -> io::Result<()>;

    fn print(&self, format: ReportFormat, out: &mut dyn Write) -> io::Result<()> {
        match format {
            ReportFormat::Text => self.write_text(out),
            ReportFormat::Json => self.write_json(out),
        }
    }
}

/// Pick the report shape for a run.
pub fn for_run(dry_run: bool) -> Box<dyn Report> {
    if dry_run {
        Box::new(DryRunReport::new())
    } else {
        Box::new(RunReport::new())
    }
}

// ---------------------------------------------------------------------------
// Full report
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RunReport {
    started: Instant,
    entries: Vec<LogEntry>,
    push_count: usize,
    remove_count: usize,
    error_count: usize,
}

#[derive(Serialize)]
struct RunReportJson<'a> {
    summary: RunSummary,
    entries: &'a [LogEntry],
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Vec::new(),
            push_count: 0,
            remove_count: 0,
            error_count: 0,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    fn write_text_with_elapsed(&self, out: &mut dyn Write, elapsed: Duration) -> io::Result<()> {
        let time_per_file = if self.entries.is_empty() {
            0.0
        } else {
            elapsed.as_secs_f64() / self.entries.len() as f64
        };

        let mut w = PrefixedWriter::new(out);
        w.line("Backup Report")?;
        w.line(RULE)?;
        w.line(&format!("Total run time (in minutes): {}", elapsed.as_secs() / 60))?;
        w.line(&format!("Total files processed: {}", self.entries.len()))?;
        w.line(&format!("Time per file (in seconds): {time_per_file:.4}"))?;
        w.line(&format!("Files added to remote: {}", self.push_count))?;
        w.line(&format!("Files removed from remote: {}", self.remove_count))?;
        w.line("")?;
        w.line("File Details")?;
        w.line(RULE)?;
        for entry in &self.entries {
            w.line(&entry.to_string())?;
        }
        w.line("")
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl Report for RunReport {
    fn record(&mut self, entry: LogEntry) {
        match entry.action_type {
            Some(ActionType::Push) => self.push_count += 1,
            Some(ActionType::Remove) => self.remove_count += 1,
            None => {}
        }
        if entry.is_error() {
            self.error_count += 1;
        }
        self.entries.push(entry);
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            total_processed: self.entries.len(),
            push_count: self.push_count,
            remove_count: self.remove_count,
            error_count: self.error_count,
            elapsed_ms: self.started.elapsed().as_millis(),
            dry_run: false,
        }
    }

    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        self.write_text_with_elapsed(out, self.started.elapsed())
    }

    fn write_json(&self, out: &mut dyn Write) -> io::Result<()> {
        let payload = RunReportJson {
            summary: self.summary(),
            entries: &self.entries,
        };
        serde_json::to_writer_pretty(&mut *out, &payload)?;
        writeln!(out)
    }
}

// ---------------------------------------------------------------------------
// Dry-run report
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DryRunReport {
    started: Instant,
    total: usize,
    push_count: usize,
    remove_count: usize,
}

impl DryRunReport {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            total: 0,
            push_count: 0,
            remove_count: 0,
        }
    }
}

impl Default for DryRunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl Report for DryRunReport {
    fn record(&mut self, entry: LogEntry) {
        self.total += 1;
        match entry.action_type {
            Some(ActionType::Push) => self.push_count += 1,
            Some(ActionType::Remove) => self.remove_count += 1,
            None => {}
        }
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            total_processed: self.total,
            push_count: self.push_count,
            remove_count: self.remove_count,
            error_count: 0,
            elapsed_ms: self.started.elapsed().as_millis(),
            dry_run: true,
        }
    }

    fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
        let mut w = PrefixedWriter::new(out);
        w.line("Dry Run Report")?;
        w.line(RULE)?;
        w.line(&format!("Total files processed: {}", self.total))?;
        w.line(&format!(
            "Files that would be added to remote: {}",
            self.push_count
        ))?;
        w.line(&format!(
            "Files that would be removed from remote: {}",
            self.remove_count
        ))?;
        w.line("")
    }

    fn write_json(&self, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.summary())?;
        writeln!(out)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

struct PrefixedWriter<'a> {
    out: &'a mut dyn Write,
}

impl<'a> PrefixedWriter<'a> {
    fn new(out: &'a mut dyn Write) -> Self {
        Self { out }
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        let stamp = Utc::now().format("%Y/%m/%d %H:%M:%S");
        writeln!(self.out, "REPORT: {stamp} {text}")
    }
}
