//! Task specifications.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of work: a task-type tag plus an opaque payload.
///
/// The tag selects a handler from the registry; the payload is passed to that
/// handler verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskSpec {
    /// The task-type tag.
    #[serde(rename = "type")]
    pub task_type: String,
    /// The opaque payload handed to the handler.
    #[serde(default)]
    pub payload: String,
}

impl TaskSpec {
    /// Creates a new task spec.
    #[must_use]
    pub fn new(task_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            payload: payload.into(),
        }
    }
}

impl fmt::Display for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type={} payload={}", self.task_type, self.payload)
    }
}
