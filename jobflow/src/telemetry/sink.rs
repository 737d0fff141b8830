//! Telemetry sink trait and implementations.

use super::{AttemptRecord, MetricsSnapshot, TaskCounters};
use parking_lot::RwLock;
use tracing::{debug, info, Level};

/// Receives attempt records and counter increments from the engine.
///
/// Implementations must be safe to call from many node tasks at once. Records
/// for one node arrive in attempt order; records for different nodes may
/// interleave arbitrarily.
pub trait TelemetrySink: Send + Sync {
    /// Appends an attempt record.
    fn record_attempt(&self, node_id: &str, attempt: u32, message: &str);

    /// Increments the success counter for a task type.
    fn increment_success(&self, task_type: &str);

    /// Increments the failure counter for a task type.
    fn increment_failure(&self, task_type: &str);

    /// Returns the current counter values.
    fn snapshot(&self) -> MetricsSnapshot;
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTelemetry;

impl TelemetrySink for NoOpTelemetry {
    fn record_attempt(&self, _node_id: &str, _attempt: u32, _message: &str) {}

    fn increment_success(&self, _task_type: &str) {}

    fn increment_failure(&self, _task_type: &str) {}

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}

/// A sink that emits records through `tracing` and keeps counters in memory.
#[derive(Debug)]
pub struct TracingTelemetry {
    /// The log level to use for attempt records.
    level: Level,
    counters: TaskCounters,
}

impl Default for TracingTelemetry {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl TracingTelemetry {
    /// Creates a new tracing sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            level,
            counters: TaskCounters::new(),
        }
    }

    /// Returns the underlying counters, e.g. for Prometheus export.
    #[must_use]
    pub const fn counters(&self) -> &TaskCounters {
        &self.counters
    }
}

impl TelemetrySink for TracingTelemetry {
    fn record_attempt(&self, node_id: &str, attempt: u32, message: &str) {
        let record = AttemptRecord::new(node_id, attempt, message);
        if self.level == Level::DEBUG {
            debug!(
                timestamp = %record.timestamp,
                node_id = %record.node_id,
                attempt = record.attempt,
                "{}", record.message
            );
        } else {
            info!(
                timestamp = %record.timestamp,
                node_id = %record.node_id,
                attempt = record.attempt,
                "{}", record.message
            );
        }
    }

    fn increment_success(&self, task_type: &str) {
        self.counters.increment_success(task_type);
    }

    fn increment_failure(&self, task_type: &str) {
        self.counters.increment_failure(task_type);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.counters.snapshot()
    }
}

/// A sink that keeps every record in memory.
///
/// Used by tests and by callers that want to inspect a run afterwards.
#[derive(Debug, Default)]
pub struct CollectingTelemetry {
    records: RwLock<Vec<AttemptRecord>>,
    counters: TaskCounters,
}

impl CollectingTelemetry {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected records in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records.read().clone()
    }

    /// Returns the records of one node in arrival order.
    #[must_use]
    pub fn records_for(&self, node_id: &str) -> Vec<AttemptRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.node_id == node_id)
            .cloned()
            .collect()
    }

    /// Returns records whose message starts with `prefix`.
    #[must_use]
    pub fn records_matching(&self, prefix: &str) -> Vec<AttemptRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.message.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Returns the number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if no records have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl TelemetrySink for CollectingTelemetry {
    fn record_attempt(&self, node_id: &str, attempt: u32, message: &str) {
        self.records
            .write()
            .push(AttemptRecord::new(node_id, attempt, message));
    }

    fn increment_success(&self, task_type: &str) {
        self.counters.increment_success(task_type);
    }

    fn increment_failure(&self, task_type: &str) {
        self.counters.increment_failure(task_type);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink() {
        let sink = NoOpTelemetry;
        sink.record_attempt("n", 0, "ignored");
        sink.increment_success("ai");
        assert_eq!(sink.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_tracing_sink_counts() {
        let sink = TracingTelemetry::new(Level::DEBUG);
        sink.record_attempt("n", 0, "Starting task");
        sink.increment_success("ai");
        sink.increment_failure("ai");

        let snapshot = sink.snapshot();
        assert_eq!(snapshot.get("ai").success, 1);
        assert_eq!(snapshot.get("ai").failure, 1);

        let text = sink.counters().to_prometheus_text().unwrap();
        assert!(text.contains("jobflow_task_failure_total{task_type=\"ai\"} 1"));
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingTelemetry::new();
        assert!(sink.is_empty());

        sink.record_attempt("a", 0, "Starting task type=x payload=1");
        sink.record_attempt("b", 0, "Starting task type=y payload=2");
        sink.record_attempt("a", 0, "Attempt 0 failed: boom");
        sink.record_attempt("a", 1, "Starting task type=x payload=1");

        assert_eq!(sink.len(), 4);

        let a = sink.records_for("a");
        assert_eq!(a.len(), 3);
        assert_eq!(a.iter().map(|r| r.attempt).collect::<Vec<_>>(), vec![0, 0, 1]);

        assert_eq!(sink.records_matching("Starting").len(), 3);
    }

    #[test]
    fn test_sink_is_object_safe() {
        let sinks: Vec<Box<dyn TelemetrySink>> = vec![
            Box::new(NoOpTelemetry),
            Box::new(TracingTelemetry::default()),
            Box::new(CollectingTelemetry::new()),
        ];
        for sink in &sinks {
            sink.increment_failure("storage");
        }
        assert_eq!(sinks[2].snapshot().get("storage").failure, 1);
    }
}
