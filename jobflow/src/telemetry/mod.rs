//! Telemetry for node executions.
//!
//! The engine reports through an injected [`TelemetrySink`]:
//! - an append-only stream of [`AttemptRecord`]s
//! - per-task-type success and failure counters, read back as a
//!   [`MetricsSnapshot`]
//!
//! Nothing here is process-global; each scheduler gets its own sink, so tests
//! observe only their own runs.

mod counters;
mod record;
mod sink;

pub use counters::{MetricsSnapshot, TaskCounters, TaskTypeCounts};
pub use record::AttemptRecord;
pub use sink::{CollectingTelemetry, NoOpTelemetry, TelemetrySink, TracingTelemetry};
