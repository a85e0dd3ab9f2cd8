//! One reconciliation pass: gather both sides, diff, dispatch.

use std::sync::Arc;

use stashback_core::{Inventory, LogEntry};

use crate::error::SyncError;
use crate::gather::{gather_all, Gatherer};
use crate::logger::Logger;
use crate::queue::ActionQueue;
use crate::reconcile::{push_actions, remove_actions};
use crate::tracker::CompletionTracker;

pub struct Processor {
    locals: Vec<Arc<dyn Gatherer>>,
    remote: Arc<dyn Gatherer>,
    logger: Logger,
    queue: ActionQueue,
    tracker: CompletionTracker,
}

impl Processor {
    pub fn new(
        locals: Vec<Arc<dyn Gatherer>>,
        remote: Arc<dyn Gatherer>,
        logger: Logger,
        queue: ActionQueue,
        tracker: CompletionTracker,
    ) -> Self {
        Self {
            locals,
            remote,
            logger,
            queue,
            tracker,
        }
    }

    /// Gather, reconcile and enqueue every action.
    ///
    /// Returns once every action is on the queue, not once it has executed;
    /// wait on the tracker for that. The only error is a fatal gather
    /// failure, which is also logged once. Nothing is enqueued in that case.
    pub async fn process(&self) -> Result<(), SyncError> {
        let (local, remote) = tokio::join!(gather_all(&self.locals), self.remote.gather());

        let local = local.map_err(SyncError::LocalGather);
        let remote = remote.map_err(SyncError::RemoteGather);
        let (local, remote) = match (local, remote) {
            (Ok(local), Ok(remote)) => (local, remote),
            (Err(err), _) | (Ok(_), Err(err)) => {
                self.logger.log(LogEntry::fatal(err.to_string()));
                return Err(err);
            }
        };
        tracing::info!(
            local = local.len(),
            remote = remote.len(),
            "inventories gathered"
        );

        let local = Arc::new(local);
        let remote = Arc::new(remote);

        let push = tokio::spawn(dispatch_push(
            local.clone(),
            remote.clone(),
            self.queue.clone(),
            self.tracker.clone(),
        ));
        let remove = tokio::spawn(dispatch_remove(
            local,
            remote,
            self.queue.clone(),
            self.tracker.clone(),
        ));

        let (push, remove) = tokio::join!(push, remove);
        let pushed = push.map_err(|e| SyncError::Join(e.to_string()))??;
        let removed = remove.map_err(|e| SyncError::Join(e.to_string()))??;
        tracing::info!(push = pushed, remove = removed, "actions dispatched");
        Ok(())
    }
}

async fn dispatch_push(
    local: Arc<Inventory>,
    remote: Arc<Inventory>,
    queue: ActionQueue,
    tracker: CompletionTracker,
) -> Result<usize, SyncError> {
    let _pass = tracker.track();
    let actions: Vec<_> = push_actions(&local, &remote).collect();
    let count = actions.len();
    for action in actions {
        queue.enqueue(action).await?;
    }
    Ok(count)
}

async fn dispatch_remove(
    local: Arc<Inventory>,
    remote: Arc<Inventory>,
    queue: ActionQueue,
    tracker: CompletionTracker,
) -> Result<usize, SyncError> {
    let _pass = tracker.track();
    let actions: Vec<_> = remove_actions(&local, &remote).collect();
    let count = actions.len();
    for action in actions {
        queue.enqueue(action).await?;
    }
    Ok(count)
}
