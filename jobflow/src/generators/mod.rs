//! Successor generators.
//!
//! A generator maps a node's successful result to the templates of the
//! children to run next. Nodes refer to generators by tag, so a dynamic graph
//! stays plain data and can be described in configuration.

pub mod builtin;
mod registry;

pub use builtin::default_generators;
pub use registry::{GeneratorRegistry, GeneratorRegistryBuilder, SuccessorFn};
