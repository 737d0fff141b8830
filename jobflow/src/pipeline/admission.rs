//! Bounded admission of node executions.
//!
//! A node takes one slot before its first attempt and keeps it through every
//! retry and backoff sleep. The gate counts slots in use and reports each
//! admission and release to an optional observer, which lets tests check the
//! concurrency limit from recorded events instead of timing.

use crate::cancellation::CancellationToken;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Receives admission events.
pub trait AdmissionObserver: Send + Sync {
    /// A node took a slot; `in_flight` includes it.
    fn on_admitted(&self, node_id: &str, in_flight: usize);

    /// A node gave its slot back; `in_flight` excludes it.
    fn on_released(&self, node_id: &str, in_flight: usize);
}

/// Counting gate limiting concurrently running nodes.
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    observer: Option<Arc<dyn AdmissionObserver>>,
}

impl AdmissionGate {
    /// Creates a gate with `capacity` slots (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Arc<Self> {
        Self::build(capacity, None)
    }

    /// Creates a gate that reports to `observer`.
    #[must_use]
    pub fn with_observer(capacity: usize, observer: Arc<dyn AdmissionObserver>) -> Arc<Self> {
        Self::build(capacity, Some(observer))
    }

    fn build(capacity: usize, observer: Option<Arc<dyn AdmissionObserver>>) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            observer,
        })
    }

    /// Waits for a slot.
    ///
    /// Returns `None` if cancellation is requested before a slot frees up.
    pub async fn admit(
        self: &Arc<Self>,
        node_id: &str,
        cancel: &CancellationToken,
    ) -> Option<AdmissionPermit> {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            permit = Arc::clone(&self.semaphore).acquire_owned() => permit.ok()?,
        };

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(observer) = &self.observer {
            observer.on_admitted(node_id, in_flight);
        }

        Some(AdmissionPermit {
            _permit: permit,
            gate: Arc::clone(self),
            node_id: node_id.to_string(),
        })
    }

    /// Returns the number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of slots currently taken.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns the highest number of slots ever taken at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("capacity", &self.capacity)
            .field("in_flight", &self.in_flight())
            .field("peak_in_flight", &self.peak_in_flight())
            .finish()
    }
}

/// One taken slot. Dropping it releases the slot.
pub struct AdmissionPermit {
    // Declared first so `Drop::drop` below runs while the slot is still held;
    // the in-flight count therefore never exceeds the permits handed out.
    _permit: OwnedSemaphorePermit,
    gate: Arc<AdmissionGate>,
    node_id: String,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        let in_flight = self.gate.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        if let Some(observer) = &self.gate.observer {
            observer.on_released(&self.node_id, in_flight);
        }
    }
}

impl std::fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPermit")
            .field("node_id", &self.node_id)
            .finish()
    }
}
