//! Attempt and node outcomes.

use super::NodeStatus;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Result of a single handler attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The handler returned a result.
    Succeeded(String),
    /// The handler returned (or panicked with) an error.
    Failed(String),
}

/// One attempt at running a node's handler.
///
/// Created once per attempt, logged, then dropped.
#[derive(Debug, Clone)]
pub struct ExecutionAttempt {
    /// The node id.
    pub node_id: String,
    /// The task-type tag.
    pub task_type: String,
    /// Attempt index, starting at 0.
    pub attempt: u32,
    /// When the handler was invoked.
    pub started_at: DateTime<Utc>,
    /// How long the handler ran.
    pub duration: Duration,
    /// What the handler produced.
    pub outcome: AttemptOutcome,
}

impl ExecutionAttempt {
    /// Emits the attempt as a debug-level tracing event.
    pub fn log(&self) {
        let (status, detail) = match &self.outcome {
            AttemptOutcome::Succeeded(result) => ("succeeded", result.as_str()),
            AttemptOutcome::Failed(error) => ("failed", error.as_str()),
        };
        tracing::debug!(
            node_id = %self.node_id,
            task_type = %self.task_type,
            attempt = self.attempt,
            started_at = %self.started_at.to_rfc3339(),
            duration_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            status,
            detail,
            "attempt finished"
        );
    }
}

/// Terminal state of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    /// The handler eventually succeeded.
    Succeeded {
        /// The handler's result, fed to successor expansion.
        result: String,
        /// Attempts consumed, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed.
    Exhausted {
        /// The error of the final attempt.
        last_error: String,
        /// Attempts consumed.
        attempts: u32,
    },
    /// The task type has no handler; nothing was invoked.
    Rejected {
        /// The unresolvable tag.
        task_type: String,
    },
    /// Cancellation was observed before or between attempts.
    Cancelled {
        /// Attempts that ran before cancellation was observed.
        attempts: u32,
        /// The cancellation reason.
        reason: String,
    },
}

impl NodeOutcome {
    /// Returns the status of this outcome.
    #[must_use]
    pub const fn status(&self) -> NodeStatus {
        match self {
            Self::Succeeded { .. } => NodeStatus::Succeeded,
            Self::Exhausted { .. } => NodeStatus::Exhausted,
            Self::Rejected { .. } => NodeStatus::Rejected,
            Self::Cancelled { .. } => NodeStatus::Cancelled,
        }
    }

    /// Returns the number of handler invocations made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts, .. } => *attempts,
            Self::Rejected { .. } => 0,
        }
    }

    /// Returns the result if the node succeeded.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        match self {
            Self::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }
}
