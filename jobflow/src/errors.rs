//! Error types for the jobflow engine.
//!
//! Per-node errors (`UnknownTaskType`, `Handler`, `Cancelled`) are contained at
//! the node boundary by the scheduler. Only [`ConfigError`] can stop a run, and
//! only before scheduling begins.

use thiserror::Error;

/// The main error type for jobflow operations.
#[derive(Debug, Error)]
pub enum JobflowError {
    /// No handler is registered for the node's task type.
    #[error("unknown task type '{0}'")]
    UnknownTaskType(String),

    /// No successor generator is registered under the given tag.
    #[error("unknown successor generator '{0}'")]
    UnknownGenerator(String),

    /// A handler invocation failed.
    #[error("{0}")]
    Handler(#[from] HandlerError),

    /// The run was cancelled.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The run configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Error returned by a task handler.
///
/// Handler errors are always retryable; the retry budget decides when to stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    /// The error message.
    pub message: String,
}

impl HandlerError {
    /// Creates a new handler error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for HandlerError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Errors raised while loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON for the run model.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// `max_concurrency` was zero.
    #[error("max_concurrency must be at least 1")]
    InvalidConcurrency,

    /// `base_delay_ms` was zero, which would make every backoff delay zero.
    #[error("base_delay_ms must be at least 1")]
    InvalidBaseDelay,

    /// A task type tag is empty or contains unsupported characters.
    #[error("invalid task type '{0}'")]
    InvalidTaskType(String),

    /// A node declares both a static `next` list and a generator.
    #[error("node '{0}' declares both static successors and a generator")]
    ConflictingSuccessors(String),

    /// A node references a generator that is not registered.
    #[error("node '{node}' references unknown generator '{generator}'")]
    UnknownGenerator {
        /// The node (id or task type) carrying the reference.
        node: String,
        /// The missing generator tag.
        generator: String,
    },

    /// Two configured nodes share an explicit id.
    #[error("duplicate node id '{0}'")]
    DuplicateNodeId(String),
}

/// Result alias for jobflow operations.
pub type Result<T> = std::result::Result<T, JobflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            JobflowError::UnknownTaskType("mint".into()).to_string(),
            "unknown task type 'mint'"
        );
        assert_eq!(
            ConfigError::UnknownGenerator {
                node: "n1".into(),
                generator: "g".into(),
            }
            .to_string(),
            "node 'n1' references unknown generator 'g'"
        );
    }

    #[test]
    fn test_handler_error_from_anyhow_keeps_context() {
        let err = anyhow::anyhow!("connection refused").context("upload failed");
        let handler_err = HandlerError::from(err);
        assert_eq!(handler_err.message, "upload failed: connection refused");
    }
}
