//! Core domain model types for jobflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Task specs and pipeline nodes
//! - Successor policies (static lists or generator references)
//! - Attempt and node outcomes

mod node;
mod outcome;
mod spec;
mod status;

pub use node::{NodeId, NodeTemplate, PipelineNode, Successors};
pub use outcome::{AttemptOutcome, ExecutionAttempt, NodeOutcome};
pub use spec::TaskSpec;
pub use status::NodeStatus;
