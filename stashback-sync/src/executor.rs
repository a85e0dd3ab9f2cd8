//! Action execution strategies.
//!
//! Selected once when the pipeline is built and shared by every worker:
//! [`RealExecutor`] calls the remote store under a deadline, [`DryRunExecutor`]
//! only describes what would have happened.

use std::sync::Arc;
use std::time::Duration;

use stashback_core::{Action, ActionType, FileRecord, LogEntry};

use crate::error::StoreError;
use crate::store::RemoteStore;

#[derive(Clone)]
pub enum Executor {
    Real(RealExecutor),
    DryRun(DryRunExecutor),
}

impl Executor {
    pub fn real(store: Arc<dyn RemoteStore>, call_timeout: Duration) -> Self {
        Executor::Real(RealExecutor::new(store, call_timeout))
    }

    pub fn dry_run() -> Self {
        Executor::DryRun(DryRunExecutor)
    }

    /// Run one action to completion and describe the outcome.
    pub async fn execute(&self, action: &Action) -> LogEntry {
        match self {
            Executor::Real(real) => real.execute(action).await,
            Executor::DryRun(dry) => dry.execute(action),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Executor::DryRun(_))
    }
}

// ---------------------------------------------------------------------------
// Real
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct RealExecutor {
    store: Arc<dyn RemoteStore>,
    call_timeout: Duration,
}

impl RealExecutor {
    pub fn new(store: Arc<dyn RemoteStore>, call_timeout: Duration) -> Self {
        Self {
            store,
            call_timeout,
        }
    }

    pub async fn execute(&self, action: &Action) -> LogEntry {
        let file = &action.file;
        match action.action_type {
            ActionType::Push => match self.bounded(self.store.put(file)).await {
                Ok(()) => LogEntry::info(
                    ActionType::Push,
                    &file.name,
                    format!("{file} pushed to remote"),
                ),
                Err(err) => LogEntry::error(
                    ActionType::Push,
                    &file.name,
                    format!("unable to push to remote for file '{file}', error: '{err}'"),
                ),
            },
            ActionType::Remove => match self.bounded(self.store.remove(&file.name)).await {
                Ok(()) => LogEntry::info(
                    ActionType::Remove,
                    &file.name,
                    format!("{file} not found locally, removing from remote"),
                ),
                Err(err) => LogEntry::error(
                    ActionType::Remove,
                    &file.name,
                    format!(
                        "{file} not found locally but unable to remove from remote, error: '{err}'"
                    ),
                ),
            },
        }
    }

    async fn bounded<F>(&self, call: F) -> Result<(), StoreError>
    where
        F: std::future::Future<Output = Result<(), StoreError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::TimedOut(self.call_timeout)),
        }
    }
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Never touches the remote.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    pub fn execute(&self, action: &Action) -> LogEntry {
        LogEntry::info(
            action.action_type,
            &action.file.name,
            describe(&action.file, action.action_type),
        )
    }
}

fn describe(file: &FileRecord, action_type: ActionType) -> String {
    match action_type {
        ActionType::Push => format!("{file} would be pushed to remote"),
        ActionType::Remove => format!("{file} not found locally, would be removed from remote"),
    }
}
