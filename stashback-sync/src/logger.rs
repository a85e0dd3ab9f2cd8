//! Log sink shared by the processor and the workers.
//!
//! Each entry is written to `tracing` straight away and then delivered to the
//! reporter on its own task. Delivery is a tracked unit: it is added before
//! [`Logger::log`] returns, so a caller that completes its own unit afterwards
//! can never let the tracker touch zero while the entry is still in transit.

use tokio::sync::mpsc;

use stashback_core::{Level, LogEntry};

use crate::tracker::CompletionTracker;

#[derive(Debug, Clone)]
pub struct Logger {
    report_tx: mpsc::Sender<LogEntry>,
    tracker: CompletionTracker,
}

impl Logger {
    pub fn new(report_tx: mpsc::Sender<LogEntry>, tracker: CompletionTracker) -> Self {
        Self { report_tx, tracker }
    }

    pub fn log(&self, entry: LogEntry) {
        match entry.level {
            Level::Info => tracing::info!(file = %entry.file, "{}", entry.message),
            Level::Error => tracing::error!(file = %entry.file, "{}", entry.message),
        }

        let unit = self.tracker.track();
        let tx = self.report_tx.clone();
        tokio::spawn(async move {
            if tx.send(entry).await.is_err() {
                tracing::warn!("reporter gone; dropping log entry");
            }
            drop(unit);
        });
    }
}
