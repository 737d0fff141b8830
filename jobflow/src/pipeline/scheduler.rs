//! Fan-out scheduler.
//!
//! Every node runs as its own tokio task. Admission is bounded by an
//! [`AdmissionGate`]; completion is tracked with an [`OutstandingCounter`]
//! because children only become known once their parent succeeds.

use super::admission::{AdmissionGate, AdmissionObserver};
use super::executor::RetryEngine;
use super::expansion::SuccessorExpander;
use super::outstanding::OutstandingCounter;
use crate::cancellation::CancellationToken;
use crate::config::RunConfig;
use crate::core::{NodeOutcome, NodeStatus, PipelineNode};
use crate::generators::GeneratorRegistry;
use crate::handlers::HandlerRegistry;
use crate::telemetry::{MetricsSnapshot, TelemetrySink};
use serde::{Serialize, Serializer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tally of one finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Successful attempts.
    pub success_count: u64,
    /// Failure observations, per the configured accounting mode.
    pub failure_count: u64,
    /// Nodes that ended cancelled.
    pub cancelled_count: u64,
    /// Nodes submitted, roots and children.
    pub nodes_submitted: u64,
    /// Nodes that ended succeeded.
    pub nodes_succeeded: u64,
    /// Nodes that ran out of retries.
    pub nodes_exhausted: u64,
    /// Nodes with no registered handler.
    pub nodes_rejected: u64,
    /// Highest number of nodes admitted at once.
    pub peak_in_flight: usize,
    /// Wall-clock time from first submission to completion.
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Runs a dynamically expanding task graph under a concurrency limit.
pub struct FanOutScheduler {
    handlers: HandlerRegistry,
    generators: GeneratorRegistry,
    telemetry: Arc<dyn TelemetrySink>,
    observer: Option<Arc<dyn AdmissionObserver>>,
}

impl FanOutScheduler {
    /// Creates a scheduler.
    #[must_use]
    pub fn new(
        handlers: HandlerRegistry,
        generators: GeneratorRegistry,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            handlers,
            generators,
            telemetry,
            observer: None,
        }
    }

    /// Reports admission events of every run to `observer`.
    #[must_use]
    pub fn with_admission_observer(mut self, observer: Arc<dyn AdmissionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the injected telemetry sink's counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.telemetry.snapshot()
    }

    /// Runs every root of `config` and all of their successors.
    ///
    /// Returns once no submitted node is left outstanding. Per-node failures
    /// never abort the run. After `cancel` fires no new attempt starts and no
    /// successor is submitted; handlers already running are awaited.
    pub async fn run(&self, config: &RunConfig, cancel: Arc<CancellationToken>) -> RunSummary {
        let start = Instant::now();
        let roots = config.root_templates();
        let gate = match &self.observer {
            Some(observer) => {
                AdmissionGate::with_observer(config.max_concurrency, Arc::clone(observer))
            }
            None => AdmissionGate::new(config.max_concurrency),
        };
        info!(
            roots = roots.len(),
            max_concurrency = gate.capacity(),
            max_retries = config.max_retries,
            max_depth = ?config.max_depth,
            "Starting run"
        );

        let tally = Arc::new(RunTally::new(Arc::clone(&self.telemetry)));
        let state = Arc::new(RunState {
            engine: RetryEngine::new(
                self.handlers.clone(),
                Arc::clone(&tally) as Arc<dyn TelemetrySink>,
                config.retry_policy(),
            ),
            expander: SuccessorExpander::new(self.generators.clone()),
            gate: Arc::clone(&gate),
            outstanding: OutstandingCounter::new(),
            cancel,
            max_depth: config.max_depth,
            tally: Arc::clone(&tally),
        });

        for template in roots {
            RunState::submit(&state, PipelineNode::root(template));
        }
        state.outstanding.wait_for_zero().await;

        let summary = tally.summary(
            state.outstanding.total_submitted(),
            gate.peak_in_flight(),
            start.elapsed(),
        );
        info!(
            success_count = summary.success_count,
            failure_count = summary.failure_count,
            cancelled_count = summary.cancelled_count,
            nodes_submitted = summary.nodes_submitted,
            duration_ms = u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            "Run complete"
        );
        summary
    }
}

impl std::fmt::Debug for FanOutScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutScheduler")
            .field("handlers", &self.handlers)
            .field("generators", &self.generators)
            .finish_non_exhaustive()
    }
}

/// State shared by every node task of one run.
struct RunState {
    engine: RetryEngine,
    expander: SuccessorExpander,
    gate: Arc<AdmissionGate>,
    outstanding: Arc<OutstandingCounter>,
    cancel: Arc<CancellationToken>,
    max_depth: Option<u32>,
    tally: Arc<RunTally>,
}

impl RunState {
    /// Counts the node as outstanding, then spawns it.
    fn submit(state: &Arc<Self>, node: PipelineNode) {
        let guard = state.outstanding.enter();
        let task_state = Arc::clone(state);
        tokio::spawn(async move {
            let _guard = guard;
            task_state.run_node(node).await;
        });
    }

    async fn run_node(self: &Arc<Self>, node: PipelineNode) {
        debug!(
            node_id = %node.id(),
            task_type = %node.task_type(),
            depth = node.depth(),
            parent = ?node.parent(),
            "Node submitted"
        );

        let outcome = match self.gate.admit(node.id(), &self.cancel).await {
            Some(permit) => {
                let outcome = self.engine.execute(&node, &self.cancel).await;
                drop(permit);
                outcome
            }
            None => {
                let reason = self
                    .cancel
                    .reason()
                    .unwrap_or_else(|| "cancelled".to_string());
                info!(node_id = %node.id(), reason = %reason, "Cancelled while waiting for admission");
                NodeOutcome::Cancelled {
                    attempts: 0,
                    reason,
                }
            }
        };
        let status = outcome.status();
        debug!(
            node_id = %node.id(),
            status = %status,
            attempts = outcome.attempts(),
            failed = status.is_failure(),
            "Node finished"
        );
        self.tally.record_outcome(status);

        if let Some(result) = outcome.result() {
            self.submit_children(&node, result);
        }
    }

    fn submit_children(self: &Arc<Self>, parent: &PipelineNode, result: &str) {
        if self.cancel.is_cancelled() {
            info!(node_id = %parent.id(), "Skipping successors after cancellation");
            return;
        }

        for child in self.expander.expand(parent, result) {
            if let Some(max_depth) = self.max_depth {
                if child.depth() > max_depth {
                    warn!(
                        node_id = %child.id(),
                        parent = %parent.id(),
                        depth = child.depth(),
                        max_depth,
                        "Pruning successor beyond depth limit"
                    );
                    continue;
                }
            }
            Self::submit(self, child);
        }
    }
}

/// Forwards to the injected sink while counting this run's observations.
struct RunTally {
    inner: Arc<dyn TelemetrySink>,
    success: AtomicU64,
    failure: AtomicU64,
    succeeded: AtomicU64,
    exhausted: AtomicU64,
    rejected: AtomicU64,
    cancelled: AtomicU64,
}

impl RunTally {
    fn new(inner: Arc<dyn TelemetrySink>) -> Self {
        Self {
            inner,
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
        }
    }

    fn record_outcome(&self, status: NodeStatus) {
        let counter = match status {
            NodeStatus::Succeeded => &self.succeeded,
            NodeStatus::Exhausted => &self.exhausted,
            NodeStatus::Rejected => &self.rejected,
            NodeStatus::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self, submitted: usize, peak_in_flight: usize, duration: Duration) -> RunSummary {
        RunSummary {
            success_count: self.success.load(Ordering::Relaxed),
            failure_count: self.failure.load(Ordering::Relaxed),
            cancelled_count: self.cancelled.load(Ordering::Relaxed),
            nodes_submitted: submitted as u64,
            nodes_succeeded: self.succeeded.load(Ordering::Relaxed),
            nodes_exhausted: self.exhausted.load(Ordering::Relaxed),
            nodes_rejected: self.rejected.load(Ordering::Relaxed),
            peak_in_flight,
            duration,
        }
    }
}

impl TelemetrySink for RunTally {
    fn record_attempt(&self, node_id: &str, attempt: u32, message: &str) {
        self.inner.record_attempt(node_id, attempt, message);
    }

    fn increment_success(&self, task_type: &str) {
        self.success.fetch_add(1, Ordering::Relaxed);
        self.inner.increment_success(task_type);
    }

    fn increment_failure(&self, task_type: &str) {
        self.failure.fetch_add(1, Ordering::Relaxed);
        self.inner.increment_failure(task_type);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.inner.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::NoOpTelemetry;

    #[tokio::test]
    async fn test_empty_run_completes_immediately() {
        let scheduler = FanOutScheduler::new(
            HandlerRegistry::default(),
            GeneratorRegistry::default(),
            Arc::new(NoOpTelemetry),
        );
        let summary = scheduler
            .run(&RunConfig::default(), Arc::new(CancellationToken::new()))
            .await;

        assert_eq!(summary.nodes_submitted, 0);
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.failure_count, 0);
        assert_eq!(summary.peak_in_flight, 0);
    }

    #[test]
    fn test_summary_serializes_duration_as_millis() {
        let summary = RunSummary {
            success_count: 2,
            duration: Duration::from_millis(1500),
            ..RunSummary::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["success_count"], 2);
        assert_eq!(json["duration_ms"], 1500);
        assert!(json.get("duration").is_none());
    }
}
