//! Run configuration.
//!
//! - the JSON data model (`model.rs`)
//! - source resolution: file, environment, built-in example (`loader.rs`)
//! - semantic checks before scheduling (`validate.rs`)

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{from_json_str, load, load_from_path, resolve, ConfigSource, CONFIG_ENV_VAR};
pub use model::{NodeConfig, NodeKey, RunConfig};
pub use validate::{is_valid_task_type, validate_config};
