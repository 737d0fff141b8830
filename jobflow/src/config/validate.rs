//! Semantic validation of a run configuration.

use super::model::{NodeConfig, RunConfig};
use crate::errors::ConfigError;
use crate::generators::GeneratorRegistry;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static TASK_TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.:-]+$").expect("task type pattern is a valid regex")
});

/// Returns true if `tag` is a well-formed task-type tag.
#[must_use]
pub fn is_valid_task_type(tag: &str) -> bool {
    TASK_TYPE_PATTERN.is_match(tag)
}

/// Checks a configuration before any node is scheduled.
///
/// This checks:
/// - `max_concurrency >= 1`
/// - `base_delay_ms >= 1`
/// - every task type is a well-formed tag
/// - no node has both `next` and `generator`
/// - explicit ids are unique across the whole tree
/// - generator tags resolve, when `generators` is given
///
/// It does not check that handlers exist for the task types; an unknown type
/// is a per-node failure at run time.
pub fn validate_config(
    config: &RunConfig,
    generators: Option<&GeneratorRegistry>,
) -> Result<(), ConfigError> {
    if config.max_concurrency == 0 {
        return Err(ConfigError::InvalidConcurrency);
    }
    if config.base_delay_ms == 0 {
        return Err(ConfigError::InvalidBaseDelay);
    }

    for task in &config.tasks {
        check_task_type(&task.task_type)?;
    }

    let mut seen_ids = HashSet::new();
    for node in &config.pipeline {
        validate_node(node, generators, &mut seen_ids)?;
    }
    Ok(())
}

fn validate_node(
    node: &NodeConfig,
    generators: Option<&GeneratorRegistry>,
    seen_ids: &mut HashSet<String>,
) -> Result<(), ConfigError> {
    check_task_type(&node.task_type)?;

    if let Some(id) = &node.id {
        let id = id.to_string();
        if !seen_ids.insert(id.clone()) {
            return Err(ConfigError::DuplicateNodeId(id));
        }
    }

    if let Some(generator) = &node.generator {
        if !node.next.is_empty() {
            return Err(ConfigError::ConflictingSuccessors(node.label()));
        }
        if let Some(registry) = generators {
            if !registry.contains(generator) {
                return Err(ConfigError::UnknownGenerator {
                    node: node.label(),
                    generator: generator.clone(),
                });
            }
        }
    }

    for child in &node.next {
        validate_node(child, generators, seen_ids)?;
    }
    Ok(())
}

fn check_task_type(tag: &str) -> Result<(), ConfigError> {
    if is_valid_task_type(tag) {
        Ok(())
    } else {
        Err(ConfigError::InvalidTaskType(tag.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TaskSpec;
    use crate::generators::default_generators;

    #[test]
    fn test_task_type_pattern() {
        assert!(is_valid_task_type("ai"));
        assert!(is_valid_task_type("ledger.v2:mint-nft_1"));
        assert!(!is_valid_task_type(""));
        assert!(!is_valid_task_type("has space"));
        assert!(!is_valid_task_type("emoji🚀"));
    }

    #[test]
    fn test_example_is_valid() {
        let generators = default_generators();
        validate_config(&RunConfig::example(), Some(&generators)).unwrap();
    }

    #[test]
    fn test_zero_concurrency() {
        let config = RunConfig::default().with_max_concurrency(0);
        assert!(matches!(
            validate_config(&config, None),
            Err(ConfigError::InvalidConcurrency)
        ));
    }

    #[test]
    fn test_invalid_task_type_in_flat_tasks() {
        let config = RunConfig::default().with_tasks(vec![TaskSpec::new("bad type", "x")]);
        assert!(matches!(
            validate_config(&config, None),
            Err(ConfigError::InvalidTaskType(tag)) if tag == "bad type"
        ));
    }

    #[test]
    fn test_conflicting_successors() {
        let node = NodeConfig::new("ai", "p")
            .with_id("n1")
            .with_generator("ai_followups")
            .with_next(vec![NodeConfig::new("storage", "/f")]);
        let config = RunConfig::default().with_pipeline(vec![node]);
        assert!(matches!(
            validate_config(&config, None),
            Err(ConfigError::ConflictingSuccessors(label)) if label == "n1"
        ));
    }

    #[test]
    fn test_duplicate_id_across_levels() {
        let node = NodeConfig::new("a", "")
            .with_id(1_i64)
            .with_next(vec![NodeConfig::new("b", "").with_id("1")]);
        let config = RunConfig::default().with_pipeline(vec![node]);
        assert!(matches!(
            validate_config(&config, None),
            Err(ConfigError::DuplicateNodeId(id)) if id == "1"
        ));
    }

    #[test]
    fn test_zero_base_delay_rejected() {
        let config = RunConfig::example().with_base_delay_ms(0);
        assert!(matches!(
            validate_config(&config, None),
            Err(ConfigError::InvalidBaseDelay)
        ));

        validate_config(&config.with_base_delay_ms(1), None).unwrap();
    }

    #[test]
    fn test_unknown_generator_only_checked_with_registry() {
        let node = NodeConfig::new("ai", "p").with_generator("nope");
        let config = RunConfig::default().with_pipeline(vec![node]);

        validate_config(&config, None).unwrap();
        let generators = default_generators();
        assert!(matches!(
            validate_config(&config, Some(&generators)),
            Err(ConfigError::UnknownGenerator { generator, .. }) if generator == "nope"
        ));
    }
}
