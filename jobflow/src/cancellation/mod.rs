//! Cooperative cancellation.
//!
//! A single [`CancellationToken`] is shared by every node of a run. It is
//! checked before each attempt and raced against admission waits and backoff
//! sleeps; it never interrupts a handler that is already running.

mod token;

pub use token::CancellationToken;
