//! UUID generation.

use uuid::Uuid;

/// Generates a new time-ordered UUID (v7).
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::now_v7()
}

/// Generates a fresh node id.
///
/// v7 ids sort by creation time, so log lines for a run order naturally by
/// node id within the same millisecond bucket.
#[must_use]
pub fn generate_node_id() -> String {
    generate_uuid().to_string()
}
