//! Run wiring shared by every entrypoint.
//!
//! [`run`] owns the lifetime of one backup: it builds the tracker, queue,
//! reporter, logger, executor and worker pool, drives a single
//! [`Processor::process`] pass, waits for every unit of work to drain, shuts
//! the tasks down and prints the report. [`plan`] stops after the diff.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use stashback_core::config::{DEFAULT_CALL_TIMEOUT, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use stashback_core::{Action, Config, ReportFormat};

use crate::error::{report_io_err, SyncError};
use crate::executor::Executor;
use crate::gather::{gather_all, Gatherer, LocalGatherer};
use crate::logger::Logger;
use crate::processor::Processor;
use crate::queue;
use crate::reconcile::reconcile;
use crate::report::{self, RunSummary};
use crate::reporter::Reporter;
use crate::store::{RemoteListing, RemoteStore};
use crate::tracker::CompletionTracker;
use crate::worker;

/// Label used in [`SyncError::Io`] when the report sink fails.
const REPORT_SINK: &str = "<report output>";

/// Engine tunables, taken from the resolved [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub workers: usize,
    pub queue_capacity: usize,
    pub call_timeout: Duration,
    pub dry_run: bool,
    pub report_format: ReportFormat,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            dry_run: false,
            report_format: ReportFormat::Text,
        }
    }
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            workers: config.workers,
            queue_capacity: config.queue_capacity,
            call_timeout: config.call_timeout,
            dry_run: config.dry_run,
            report_format: config.report_format,
        }
    }
}

/// One gatherer per configured root, in configured order.
pub fn local_gatherers(roots: &[PathBuf]) -> Vec<Arc<dyn Gatherer>> {
    roots
        .iter()
        .map(|root| Arc::new(LocalGatherer::new(root)) as Arc<dyn Gatherer>)
        .collect()
}

/// Perform one full backup run and print its report to `out`.
///
/// Per-action failures never surface here; they are Error entries in the
/// report. A fatal gather error is returned after the report (holding only
/// that error) has been printed.
pub async fn run(
    options: RunOptions,
    locals: Vec<Arc<dyn Gatherer>>,
    remote: Arc<dyn RemoteStore>,
    out: &mut dyn Write,
) -> Result<RunSummary, SyncError> {
    let tracker = CompletionTracker::new();
    let (queue, receiver) = queue::channel(options.queue_capacity, tracker.clone());
    let (report_tx, report_rx) = mpsc::channel(options.queue_capacity.max(1));
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let reporter = Reporter::new(report_rx, report::for_run(options.dry_run))
        .spawn(shutdown_tx.subscribe());
    let logger = Logger::new(report_tx, tracker.clone());

    let executor = if options.dry_run {
        Executor::dry_run()
    } else {
        Executor::real(remote.clone(), options.call_timeout)
    };
    let workers = worker::spawn_pool(
        options.workers,
        receiver,
        Arc::new(executor),
        logger.clone(),
        tracker.clone(),
        &shutdown_tx,
    );
    tracing::info!(
        workers = workers.len(),
        dry_run = options.dry_run,
        "run started"
    );

    let processor = Processor::new(
        locals,
        Arc::new(RemoteListing::new(remote)),
        logger,
        queue,
        tracker.clone(),
    );
    let outcome = processor.process().await;
    drop(processor);

    tracker.wait().await;
    let _ = shutdown_tx.send(());

    for handle in workers {
        handle.await.map_err(|e| SyncError::Join(e.to_string()))?;
    }
    let report = reporter
        .await
        .map_err(|e| SyncError::Join(e.to_string()))?;

    report
        .print(options.report_format, out)
        .and_then(|()| out.flush())
        .map_err(|e| report_io_err(REPORT_SINK, e))?;

    let summary = report.summary();
    match outcome {
        Ok(()) => {
            tracing::info!(
                processed = summary.total_processed,
                errors = summary.error_count,
                "run finished"
            );
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(error = %err, "run aborted");
            Err(err)
        }
    }
}

/// Gather both sides and return the actions a run would dispatch, sorted by
/// type then name. Nothing is executed.
pub async fn plan(
    locals: Vec<Arc<dyn Gatherer>>,
    remote: Arc<dyn RemoteStore>,
) -> Result<Vec<Action>, SyncError> {
    let listing = RemoteListing::new(remote);
    let (local, remote) = tokio::join!(gather_all(&locals), listing.gather());
    let local = local.map_err(SyncError::LocalGather)?;
    let remote = remote.map_err(SyncError::RemoteGather)?;
    Ok(reconcile(&local, &remote))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use async_trait::async_trait;
    use stashback_core::{ActionType, FileRecord, Inventory};
    use tempfile::TempDir;

    use super::*;
    use crate::error::StoreError;
    use crate::store::{DirStore, MemoryStore};

    struct Fixed(Vec<FileRecord>);

    #[async_trait]
    impl Gatherer for Fixed {
        async fn gather(&self) -> Result<Inventory, StoreError> {
            Ok(self.0.iter().cloned().collect())
        }
    }

    fn fixed(records: &[(&str, i64)]) -> Vec<Arc<dyn Gatherer>> {
        vec![Arc::new(Fixed(
            records
                .iter()
                .map(|(name, size)| FileRecord::new(*name, *size))
                .collect(),
        ))]
    }

    fn options(dry_run: bool) -> RunOptions {
        RunOptions {
            workers: 2,
            queue_capacity: 4,
            dry_run,
            ..RunOptions::default()
        }
    }

    #[tokio::test]
    async fn run_pushes_and_removes_against_store() {
        let store = Arc::new(MemoryStore::with_objects([
            FileRecord::new("a", 100),
            FileRecord::new("stale", 3),
        ]));
        let mut out = Vec::new();

        let summary = run(
            options(false),
            fixed(&[("a", 100), ("b", 200)]),
            store.clone(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(summary.total_processed, 2);
        assert_eq!(summary.push_count, 1);
        assert_eq!(summary.remove_count, 1);
        assert_eq!(summary.error_count, 0);

        let objects = store.objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects.get("b"), Some(&200));
        assert!(!objects.contains_key("stale"));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Backup Report"));
        assert!(text.contains("Total files processed: 2"));
    }

    #[tokio::test]
    async fn dry_run_lists_but_never_mutates() {
        let store = Arc::new(MemoryStore::with_objects([FileRecord::new("old", 1)]));
        let mut out = Vec::new();

        let summary = run(options(true), fixed(&[("new", 5)]), store.clone(), &mut out)
            .await
            .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.push_count, 1);
        assert_eq!(summary.remove_count, 1);
        assert!(store.puts().is_empty());
        assert!(store.removes().is_empty());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Dry Run Report"));
        assert!(text.contains("Files that would be added to remote: 1"));
    }

    #[tokio::test]
    async fn remote_gather_failure_prints_report_then_errors() {
        let store = Arc::new(MemoryStore::new());
        store.fail_list("bucket unreachable");
        let mut out = Vec::new();

        let err = run(options(false), fixed(&[("a", 1)]), store.clone(), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::RemoteGather(_)));
        assert!(store.puts().is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total files processed: 1"));
        assert!(text.contains("bucket unreachable"));
    }

    #[tokio::test]
    async fn json_report_carries_summary() {
        let store = Arc::new(MemoryStore::new());
        let mut out = Vec::new();
        let opts = RunOptions {
            report_format: ReportFormat::Json,
            ..options(false)
        };

        run(opts, fixed(&[("a", 1)]), store, &mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["summary"]["push_count"], 1);
        assert_eq!(value["entries"][0]["file"], "a");
    }

    #[tokio::test]
    async fn plan_is_sorted_and_side_effect_free() {
        let store = Arc::new(MemoryStore::with_objects([
            FileRecord::new("z", 1),
            FileRecord::new("b", 2),
        ]));
        let actions = plan(fixed(&[("c", 1), ("a", 1), ("b", 3)]), store.clone())
            .await
            .unwrap();

        let got: Vec<_> = actions
            .iter()
            .map(|a| (a.action_type, a.file.name.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                (ActionType::Push, "a"),
                (ActionType::Push, "b"),
                (ActionType::Push, "c"),
                (ActionType::Remove, "z"),
            ]
        );
        assert!(store.puts().is_empty());
        assert!(store.removes().is_empty());
    }

    #[tokio::test]
    async fn local_directories_mirror_into_dir_store() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("docs");
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("top.txt"), "hello").unwrap();
        fs::write(root.join("nested/deep.txt"), "abc").unwrap();
        let bucket = tmp.path().join("bucket");
        fs::create_dir_all(&bucket).unwrap();

        let store: Arc<dyn RemoteStore> = Arc::new(DirStore::new(&bucket));
        let mut out = Vec::new();
        let summary = run(
            options(false),
            local_gatherers(&[root.clone()]),
            store.clone(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(summary.push_count, 2);
        assert_eq!(
            fs::read_to_string(bucket.join("docs/nested/deep.txt")).unwrap(),
            "abc"
        );

        // Second run over an unchanged tree has nothing to do.
        let mut out = Vec::new();
        let again = run(options(false), local_gatherers(&[root]), store, &mut out)
            .await
            .unwrap();
        assert_eq!(again.total_processed, 0);
    }

    #[test]
    fn options_follow_config() {
        let config = Config {
            roots: vec![PathBuf::from("/data")],
            bucket: PathBuf::from("/bucket"),
            workers: 9,
            queue_capacity: 3,
            call_timeout: Duration::from_secs(7),
            dry_run: true,
            report_path: None,
            report_format: ReportFormat::Json,
        };
        let opts = RunOptions::from(&config);
        assert_eq!(opts.workers, 9);
        assert_eq!(opts.queue_capacity, 3);
        assert_eq!(opts.call_timeout, Duration::from_secs(7));
        assert!(opts.dry_run);
        assert_eq!(opts.report_format, ReportFormat::Json);
    }
}
