//! # stashback-sync
//!
//! Reconciliation-and-dispatch engine.
//!
//! A run gathers the local roots and the remote listing in parallel, diffs
//! them into push/remove [`Action`](stashback_core::Action)s, fans those out
//! to a bounded worker pool and prints a report once every action and every
//! log delivery has completed. Call [`pipeline::run`] for a full backup or
//! [`pipeline::plan`] to only compute the diff.
//!
//! Every unit of work is counted on one [`CompletionTracker`] before it
//! becomes visible to a consumer: [`ActionQueue::enqueue`] counts then sends,
//! and [`Logger::log`] counts the delivery before it returns.

pub mod error;
pub mod executor;
pub mod gather;
pub mod logger;
pub mod pipeline;
pub mod processor;
pub mod queue;
pub mod reconcile;
pub mod report;
pub mod reporter;
pub mod store;
pub mod tracker;
pub mod worker;

pub use error::{StoreError, SyncError};
pub use executor::Executor;
pub use gather::{Gatherer, LocalGatherer};
pub use logger::Logger;
pub use pipeline::{local_gatherers, plan, run, RunOptions};
pub use processor::Processor;
pub use queue::{ActionQueue, ActionReceiver};
pub use reconcile::reconcile;
pub use report::{DryRunReport, Report, RunReport, RunSummary};
pub use store::{DirStore, MemoryStore, RemoteListing, RemoteStore};
pub use tracker::CompletionTracker;
