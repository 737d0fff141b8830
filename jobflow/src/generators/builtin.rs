//! Stock generators linking the built-in task types.
//!
//! `ai_followups` and `blockchain_followups` refer to each other, so a graph
//! seeded with either keeps growing until a handler fails, the run is
//! cancelled, or the scheduler's `max_depth` prunes it.

use super::GeneratorRegistry;
use crate::core::{NodeTemplate, TaskSpec};
use crate::handlers::builtin::{AI, BLOCKCHAIN, STORAGE};

/// Tag of [`ai_followups`].
pub const AI_FOLLOWUPS: &str = "ai_followups";
/// Tag of [`blockchain_followups`].
pub const BLOCKCHAIN_FOLLOWUPS: &str = "blockchain_followups";

/// Contract action minted after generated content.
const MINT_ACTION: &str = "mintNFT:0xContract";
/// Where generated content is expected to land for pinning.
const CONTENT_PATH: &str = "/tmp/content.txt";

/// After generating content: mint it on chain and pin it to storage.
///
/// Empty content produces no children.
#[must_use]
pub fn ai_followups(output: &str) -> Vec<NodeTemplate> {
    if output.is_empty() {
        return Vec::new();
    }
    vec![
        NodeTemplate::new(TaskSpec::new(BLOCKCHAIN, MINT_ACTION)).generated_by(BLOCKCHAIN_FOLLOWUPS),
        NodeTemplate::new(TaskSpec::new(STORAGE, CONTENT_PATH)),
    ]
}

/// After a confirmed transaction: ask for an analysis of it.
#[must_use]
pub fn blockchain_followups(tx_hash: &str) -> Vec<NodeTemplate> {
    vec![NodeTemplate::new(TaskSpec::new(AI, format!("Analyze tx {tx_hash}")))
        .generated_by(AI_FOLLOWUPS)]
}

/// Builds a registry with the stock generators.
#[must_use]
pub fn default_generators() -> GeneratorRegistry {
    GeneratorRegistry::builder()
        .register(AI_FOLLOWUPS, ai_followups)
        .register(BLOCKCHAIN_FOLLOWUPS, blockchain_followups)
        .build()
}
