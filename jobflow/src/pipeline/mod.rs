//! Scheduling and execution.
//!
//! This module provides:
//! - The retry engine with exponential backoff
//! - Successor expansion for static and generated children
//! - The fan-out scheduler with bounded admission and outstanding-work tracking

mod admission;
mod executor;
mod expansion;
mod outstanding;
mod retry;
mod scheduler;


pub use admission::{AdmissionGate, AdmissionObserver, AdmissionPermit};
pub use executor::{sleep_or_cancel, RetryEngine};
pub use expansion::SuccessorExpander;
pub use outstanding::OutstandingCounter;
pub use retry::{
    BackoffPolicy, FailureAccounting, RetryPolicy, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_RETRIES,
};
pub use scheduler::{FanOutScheduler, RunSummary};
