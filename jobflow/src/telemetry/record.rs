//! Attempt log records.

use crate::utils::iso_timestamp;
use serde::{Deserialize, Serialize};

/// One entry in the attempt log stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// When the record was emitted (RFC 3339).
    pub timestamp: String,
    /// The node the record belongs to.
    pub node_id: String,
    /// Attempt index, starting at 0.
    pub attempt: u32,
    /// Human-readable message.
    pub message: String,
}

impl AttemptRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(node_id: impl Into<String>, attempt: u32, message: impl Into<String>) -> Self {
        Self {
            timestamp: iso_timestamp(),
            node_id: node_id.into(),
            attempt,
            message: message.into(),
        }
    }
}

