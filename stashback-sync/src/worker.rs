//! Fixed-size pool of action workers.
//!
//! Each worker loops: take one action, execute it, log exactly one entry,
//! complete the action's unit. Workers share only the queue receiver, the
//! executor and the tracker. They exit on the shutdown signal or when the
//! queue closes.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::executor::Executor;
use crate::logger::Logger;
use crate::queue::ActionReceiver;
use crate::tracker::CompletionTracker;

pub struct Worker {
    id: usize,
    queue: ActionReceiver,
    executor: Arc<Executor>,
    logger: Logger,
    tracker: CompletionTracker,
}

impl Worker {
    pub fn new(
        id: usize,
        queue: ActionReceiver,
        executor: Arc<Executor>,
        logger: Logger,
        tracker: CompletionTracker,
    ) -> Self {
        Self {
            id,
            queue,
            executor,
            logger,
            tracker,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            let action = tokio::select! {
                _ = shutdown.recv() => break,
                action = self.queue.next() => action,
            };
            let Some(action) = action else { break };

            tracing::debug!(
                worker = self.id,
                file = %action.file.name,
                action = %action.action_type,
                "executing action",
            );
            let entry = self.executor.execute(&action).await;
            // The log delivery unit is added inside `log`, before this
            // action's unit is released.
            self.logger.log(entry);
            self.tracker.done();
        }
        tracing::debug!(worker = self.id, "worker stopped");
    }
}

/// Spawn `count` workers draining `queue`.
pub fn spawn_pool(
    count: usize,
    queue: ActionReceiver,
    executor: Arc<Executor>,
    logger: Logger,
    tracker: CompletionTracker,
    shutdown: &broadcast::Sender<()>,
) -> Vec<JoinHandle<()>> {
    (0..count.max(1))
        .map(|id| {
            let worker = Worker::new(
                id,
                queue.clone(),
                executor.clone(),
                logger.clone(),
                tracker.clone(),
            );
            tokio::spawn(worker.run(shutdown.subscribe()))
        })
        .collect()
}
