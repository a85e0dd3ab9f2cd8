//! The single consumer of the log stream.
//!
//! Runs as its own task and owns the [`Report`] exclusively until it is
//! handed back on shutdown. On shutdown the channel is closed and whatever is
//! still buffered is recorded before the task returns, so nothing delivered
//! before the signal is lost.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use stashback_core::LogEntry;

use crate::report::Report;

pub struct Reporter {
    rx: mpsc::Receiver<LogEntry>,
    report: Box<dyn Report>,
}

impl Reporter {
    pub fn new(rx: mpsc::Receiver<LogEntry>, report: Box<dyn Report>) -> Self {
        Self { rx, report }
    }

    /// Start consuming. The handle resolves to the finished report.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<Box<dyn Report>> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Box<dyn Report> {
        loop {
            let signalled = tokio::select! {
                biased;
                entry = self.rx.recv() => match entry {
                    Some(entry) => {
                        self.report.record(entry);
                        continue;
                    }
                    None => false,
                },
                _ = shutdown.recv() => true,
            };
            if signalled {
                self.rx.close();
                while let Some(entry) = self.rx.recv().await {
                    self.report.record(entry);
                }
            }
            break;
        }
        tracing::debug!(entries = self.report.summary().total_processed, "reporter stopped");
        self.report
    }
}
