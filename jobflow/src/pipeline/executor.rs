//! Retry engine: drives one node through its attempts.

use super::retry::{FailureAccounting, RetryPolicy};
use crate::cancellation::CancellationToken;
use crate::core::{AttemptOutcome, ExecutionAttempt, NodeOutcome, PipelineNode};
use crate::errors::HandlerError;
use crate::handlers::{HandlerRegistry, TaskHandler};
use crate::telemetry::TelemetrySink;
use crate::utils::now_utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Executes nodes with bounded retries and exponential backoff.
///
/// Each attempt emits a "starting" record and then either a "succeeded" or a
/// "failed" record through the telemetry sink. Cancellation is checked before
/// every attempt and raced against every backoff sleep; a handler that is
/// already running is never interrupted.
pub struct RetryEngine {
    handlers: HandlerRegistry,
    telemetry: Arc<dyn TelemetrySink>,
    policy: RetryPolicy,
}

impl RetryEngine {
    /// Creates a new retry engine.
    #[must_use]
    pub fn new(
        handlers: HandlerRegistry,
        telemetry: Arc<dyn TelemetrySink>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            handlers,
            telemetry,
            policy,
        }
    }

    /// Runs `node` until it succeeds, exhausts its retries, or is cancelled.
    pub async fn execute(&self, node: &PipelineNode, cancel: &CancellationToken) -> NodeOutcome {
        if let Some(outcome) = self.check_cancelled(node, 0, cancel) {
            return outcome;
        }

        let handler = match self.handlers.resolve(node.task_type()) {
            Ok(handler) => handler,
            Err(err) => {
                warn!(node_id = %node.id(), error = %err, "Rejecting node");
                self.telemetry.record_attempt(
                    node.id(),
                    0,
                    &format!("Unknown task type {}", node.task_type()),
                );
                self.telemetry.increment_failure(node.task_type());
                return NodeOutcome::Rejected {
                    task_type: node.task_type().to_string(),
                };
            }
        };

        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;
        loop {
            if let Some(outcome) = self.check_cancelled(node, attempt, cancel) {
                return outcome;
            }

            self.telemetry.record_attempt(
                node.id(),
                attempt,
                &format!("Starting task {}", node.spec()),
            );

            let result = self.invoke(node, attempt, handler.as_ref()).await;
            let attempts = attempt + 1;

            match result {
                Ok(output) => {
                    self.telemetry.record_attempt(
                        node.id(),
                        attempt,
                        &format!("Attempt {attempt} succeeded: {output}"),
                    );
                    self.telemetry.increment_success(node.task_type());
                    return NodeOutcome::Succeeded {
                        result: output,
                        attempts,
                    };
                }
                Err(err) => {
                    self.telemetry.record_attempt(
                        node.id(),
                        attempt,
                        &format!("Attempt {attempt} failed: {err}"),
                    );
                    if self.policy.failure_accounting == FailureAccounting::PerAttempt {
                        self.telemetry.increment_failure(node.task_type());
                    }

                    if attempts >= max_attempts {
                        if self.policy.failure_accounting == FailureAccounting::PerNode {
                            self.telemetry.increment_failure(node.task_type());
                        }
                        warn!(
                            node_id = %node.id(),
                            task_type = %node.task_type(),
                            attempts,
                            error = %err,
                            "Node exhausted its retries"
                        );
                        return NodeOutcome::Exhausted {
                            last_error: err.message,
                            attempts,
                        };
                    }

                    let delay = self.policy.backoff.delay(attempt);
                    debug!(
                        node_id = %node.id(),
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Backing off before retry"
                    );
                    if !sleep_or_cancel(delay, cancel).await {
                        return self.cancelled(node, attempts, cancel);
                    }
                }
            }

            attempt += 1;
        }
    }

    /// Invokes the handler once, turning a panic into a handler error.
    async fn invoke(
        &self,
        node: &PipelineNode,
        attempt: u32,
        handler: &dyn TaskHandler,
    ) -> Result<String, HandlerError> {
        let started_at = now_utc();
        let start = Instant::now();

        let result = AssertUnwindSafe(handler.handle(node.payload()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HandlerError::new(panic_message(panic.as_ref()))));

        let record = ExecutionAttempt {
            node_id: node.id().to_string(),
            task_type: node.task_type().to_string(),
            attempt,
            started_at,
            duration: start.elapsed(),
            outcome: match &result {
                Ok(output) => AttemptOutcome::Succeeded(output.clone()),
                Err(err) => AttemptOutcome::Failed(err.message.clone()),
            },
        };
        record.log();

        result
    }

    fn check_cancelled(
        &self,
        node: &PipelineNode,
        attempts: u32,
        cancel: &CancellationToken,
    ) -> Option<NodeOutcome> {
        cancel
            .is_cancelled()
            .then(|| self.cancelled(node, attempts, cancel))
    }

    fn cancelled(
        &self,
        node: &PipelineNode,
        attempts: u32,
        cancel: &CancellationToken,
    ) -> NodeOutcome {
        let reason = cancel.reason().unwrap_or_else(|| "cancelled".to_string());
        self.telemetry
            .record_attempt(node.id(), attempts, &format!("Task canceled: {reason}"));
        info!(node_id = %node.id(), attempts, reason = %reason, "Node cancelled");
        NodeOutcome::Cancelled { attempts, reason }
    }
}

impl std::fmt::Debug for RetryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryEngine")
            .field("handlers", &self.handlers)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Sleeps for `delay` unless cancellation fires first.
///
/// Returns `false` if the sleep was cut short by cancellation.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("handler panicked: {detail}")
}
