//! Task handlers and the registry that resolves them.
//!
//! A handler is the capability behind a task-type tag. The engine only sees
//! the [`TaskHandler`] interface; what a handler does (and whether it is
//! idempotent) is its own business.

pub mod builtin;
mod registry;

pub use builtin::{default_registry, registry_with, BuiltinOptions};
pub use registry::{FnHandler, HandlerRegistry, HandlerRegistryBuilder, TaskHandler};

#[cfg(test)]
pub use registry::MockTaskHandler;
