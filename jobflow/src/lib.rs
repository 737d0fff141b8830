//! # Jobflow
//!
//! A fan-out job runner over a dynamically expanding task graph.
//!
//! Jobflow runs tasks under a concurrency limit with:
//!
//! - **Typed handlers**: a task-type tag resolves to an async [`handlers::TaskHandler`]
//! - **Bounded retries**: exponential backoff between attempts, interruptible by cancellation
//! - **Dynamic successors**: children from a static list or generated from a node's result
//! - **Outstanding-work completion**: a run ends when no submitted node is left
//! - **Telemetry**: per-attempt records and per-type success/failure counters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jobflow::prelude::*;
//! use std::sync::Arc;
//!
//! let handlers = HandlerRegistry::builder()
//!     .register_fn("echo", |payload| async move { Ok(payload) })
//!     .build();
//! let scheduler = FanOutScheduler::new(handlers, GeneratorRegistry::default(), Arc::new(TracingTelemetry::default()));
//!
//! let config = RunConfig::default().with_tasks(vec![TaskSpec::new("echo", "hi")]);
//! let summary = scheduler.run(&config, Arc::new(CancellationToken::new())).await;
//! assert_eq!(summary.success_count, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod generators;
pub mod handlers;
pub mod logging;
pub mod pipeline;
pub mod telemetry;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{NodeConfig, RunConfig};
    pub use crate::core::{NodeOutcome, NodeStatus, NodeTemplate, PipelineNode, Successors, TaskSpec};
    pub use crate::errors::{ConfigError, HandlerError, JobflowError};
    pub use crate::generators::{default_generators, GeneratorRegistry};
    pub use crate::handlers::{default_registry, HandlerRegistry, TaskHandler};
    pub use crate::pipeline::{
        BackoffPolicy, FailureAccounting, FanOutScheduler, RetryEngine, RetryPolicy, RunSummary,
    };
    pub use crate::telemetry::{
        CollectingTelemetry, MetricsSnapshot, NoOpTelemetry, TelemetrySink, TracingTelemetry,
    };
    pub use crate::utils::{generate_node_id, iso_timestamp, Timestamp};
}
