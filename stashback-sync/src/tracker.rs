//! Completion tracking for every unit of work dispatched in a run.
//!
//! One tracker is shared by the whole run. Units come from two sources:
//! queued actions and asynchronous log deliveries to the reporter. A unit
//! must be added before the work it stands for becomes visible to anyone who
//! could finish it, otherwise [`CompletionTracker::wait`] may observe zero
//! while that work is still in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Counter of outstanding work with an async wait-for-zero.
#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    zero: Notify,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `n` more units as pending.
    pub fn add(&self, n: usize) {
        self.inner.pending.fetch_add(n, Ordering::AcqRel);
    }

    /// Mark one unit as complete.
    ///
    /// A `done` with nothing pending is a bookkeeping bug; it is logged and
    /// otherwise ignored rather than wrapping the counter.
    pub fn done(&self) {
        let previous = self
            .inner
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => self.inner.zero.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::error!("completion tracker decremented below zero"),
        }
    }

    /// Units still outstanding.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Resolve once the pending count is zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.zero.notified();
            tokio::pin!(notified);
            // Register before checking so a notify between the load and the
            // await is not lost.
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Add one unit and hand back a guard that completes it on drop.
    pub fn track(&self) -> TrackedUnit {
        self.add(1);
        TrackedUnit {
            tracker: self.clone(),
        }
    }
}

/// One pending unit, completed when dropped.
#[derive(Debug)]
pub struct TrackedUnit {
    tracker: CompletionTracker,
}

impl Drop for TrackedUnit {
    fn drop(&mut self) {
        self.tracker.done();
    }
}
