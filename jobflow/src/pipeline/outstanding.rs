//! Outstanding-work counter.
//!
//! Children are discovered only after their parent succeeds, so a run cannot
//! be joined on its initial node list. Instead every submitted node holds an
//! [`OutstandingGuard`] until it is terminal, and the run is complete exactly
//! when the count returns to zero.
//!
//! A parent submits its children (raising the count) before its own guard is
//! dropped, so the count never touches zero while a branch is still expanding.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::warn;

/// Count of submitted but not yet terminal nodes.
#[derive(Debug, Default)]
pub struct OutstandingCounter {
    count: AtomicUsize,
    submitted: AtomicUsize,
    zero: Notify,
}

impl OutstandingCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a newly submitted node.
    ///
    /// The returned guard marks the node terminal when dropped.
    pub(crate) fn enter(self: &Arc<Self>) -> OutstandingGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.submitted.fetch_add(1, Ordering::SeqCst);
        OutstandingGuard {
            counter: Arc::clone(self),
        }
    }

    fn leave(&self) {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1));
        match previous {
            Ok(1) => self.zero.notify_waiters(),
            Ok(_) => {}
            Err(_) => warn!("Outstanding counter released below zero"),
        }
    }

    /// Returns the number of outstanding nodes.
    #[must_use]
    pub fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Returns how many nodes have ever been submitted.
    #[must_use]
    pub fn total_submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Completes once no node is outstanding.
    pub async fn wait_for_zero(&self) {
        loop {
            let notified = self.zero.notified();
            if self.current() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Held by a node from submission until it is terminal.
#[derive(Debug)]
pub(crate) struct OutstandingGuard {
    counter: Arc<OutstandingCounter>,
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.counter.leave();
    }
}
