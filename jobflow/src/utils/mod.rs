//! Identifier and timestamp helpers.

mod timestamps;
mod uuid_utils;

pub use timestamps::{iso_timestamp, now_utc, Timestamp};
pub use uuid_utils::{generate_node_id, generate_uuid};
