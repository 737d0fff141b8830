//! Node status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The terminal status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// The handler succeeded; successors may follow.
    Succeeded,
    /// The retry budget was consumed.
    Exhausted,
    /// The task type could not be resolved.
    Rejected,
    /// Cancellation was observed.
    Cancelled,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl NodeStatus {
    /// Returns true if the status is a task defect rather than a shutdown.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Rejected)
    }
}
