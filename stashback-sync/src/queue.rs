//! Bounded multi-producer, multi-consumer action queue.
//!
//! [`ActionQueue::enqueue`] is the only way to put an action on the queue and
//! always registers the action with the tracker first. Consumers share one
//! receiver behind a mutex; whichever worker holds the lock takes the next
//! action.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use stashback_core::Action;

use crate::error::SyncError;
use crate::tracker::CompletionTracker;

/// Producer side. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ActionQueue {
    tx: mpsc::Sender<Action>,
    tracker: CompletionTracker,
}

/// Consumer side, shared by every worker.
#[derive(Debug, Clone)]
pub struct ActionReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Action>>>,
}

/// Create a queue holding at most `capacity` undelivered actions.
pub fn channel(capacity: usize, tracker: CompletionTracker) -> (ActionQueue, ActionReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ActionQueue { tx, tracker },
        ActionReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl ActionQueue {
    /// Count the action as pending, then send it. Waits while the queue is full.
    ///
    /// If every receiver is gone the unit is released again and the action is
    /// dropped.
    pub async fn enqueue(&self, action: Action) -> Result<(), SyncError> {
        self.tracker.add(1);
        if self.tx.send(action).await.is_err() {
            self.tracker.done();
            return Err(SyncError::ChannelClosed("action queue"));
        }
        Ok(())
    }
}

impl ActionReceiver {
    /// Next action, or `None` once all producers are dropped and the queue is empty.
    pub async fn next(&self) -> Option<Action> {
        self.rx.lock().await.recv().await
    }
}
