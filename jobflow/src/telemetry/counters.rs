//! Success and failure counters keyed by task type.

use prometheus::proto::MetricFamily;
use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SUCCESS_METRIC: &str = "jobflow_task_success_total";
const FAILURE_METRIC: &str = "jobflow_task_failure_total";
const TASK_TYPE_LABEL: &str = "task_type";

/// Monotonic counters, safe to bump from many node tasks at once.
///
/// Each instance owns its own [`Registry`]; nothing is registered globally.
#[derive(Debug, Clone)]
pub struct TaskCounters {
    registry: Registry,
    success: IntCounterVec,
    failure: IntCounterVec,
}

impl TaskCounters {
    /// Creates empty counters registered in a fresh registry.
    pub fn try_new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let success = IntCounterVec::new(
            Opts::new(SUCCESS_METRIC, "Successful task observations."),
            &[TASK_TYPE_LABEL],
        )?;
        let failure = IntCounterVec::new(
            Opts::new(FAILURE_METRIC, "Failed task observations."),
            &[TASK_TYPE_LABEL],
        )?;
        registry.register(Box::new(success.clone()))?;
        registry.register(Box::new(failure.clone()))?;
        Ok(Self {
            registry,
            success,
            failure,
        })
    }

    /// Creates empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the success counter for a task type.
    pub fn increment_success(&self, task_type: &str) {
        self.success.with_label_values(&[task_type]).inc();
    }

    /// Increments the failure counter for a task type.
    pub fn increment_failure(&self, task_type: &str) {
        self.failure.with_label_values(&[task_type]).inc();
    }

    /// Takes a point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_families(&self.registry.gather())
    }

    /// Renders every counter in the Prometheus text exposition format.
    pub fn to_prometheus_text(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl Default for TaskCounters {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::try_new().expect("static counter descriptors register in a fresh registry")
    }
}

/// Counts for one task type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTypeCounts {
    /// Successful observations.
    pub success: u64,
    /// Failed observations.
    pub failure: u64,
}

/// Pull surface for the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Counts per task type, ordered by tag.
    pub by_type: BTreeMap<String, TaskTypeCounts>,
}

impl MetricsSnapshot {
    /// Returns the counts for one task type.
    #[must_use]
    pub fn get(&self, task_type: &str) -> TaskTypeCounts {
        self.by_type.get(task_type).copied().unwrap_or_default()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_families(families: &[MetricFamily]) -> Self {
        let mut by_type: BTreeMap<String, TaskTypeCounts> = BTreeMap::new();
        for family in families {
            let is_success = match family.get_name() {
                SUCCESS_METRIC => true,
                FAILURE_METRIC => false,
                _ => continue,
            };
            for metric in family.get_metric() {
                let Some(task_type) = metric
                    .get_label()
                    .iter()
                    .find(|pair| pair.get_name() == TASK_TYPE_LABEL)
                    .map(|pair| pair.get_value().to_string())
                else {
                    continue;
                };
                // Integer counters are exposed as whole-valued f64.
                let value = metric.get_counter().get_value() as u64;
                let counts = by_type.entry(task_type).or_default();
                if is_success {
                    counts.success = value;
                } else {
                    counts.failure = value;
                }
            }
        }
        Self { by_type }
    }
}
