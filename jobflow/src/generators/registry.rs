//! Generator registry.

use crate::core::NodeTemplate;
use crate::errors::JobflowError;
use std::collections::HashMap;
use std::sync::Arc;

/// A successor generator: a pure function of the parent's result.
pub type SuccessorFn = dyn Fn(&str) -> Vec<NodeTemplate> + Send + Sync;

/// Immutable mapping from generator tag to generator.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: Arc<HashMap<String, Arc<SuccessorFn>>>,
}

impl GeneratorRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> GeneratorRegistryBuilder {
        GeneratorRegistryBuilder::default()
    }

    /// Resolves a tag to its generator.
    pub fn resolve(&self, tag: &str) -> Result<Arc<SuccessorFn>, JobflowError> {
        self.generators
            .get(tag)
            .cloned()
            .ok_or_else(|| JobflowError::UnknownGenerator(tag.to_string()))
    }

    /// Returns true if a generator is registered under the tag.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.generators.contains_key(tag)
    }

    /// Lists registered tags in sorted order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.generators.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Returns the number of registered generators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Returns true if no generators are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Collects generators before the registry is frozen.
#[derive(Default)]
pub struct GeneratorRegistryBuilder {
    generators: HashMap<String, Arc<SuccessorFn>>,
}

impl GeneratorRegistryBuilder {
    /// Registers a generator. A later registration for the same tag wins.
    #[must_use]
    pub fn register<F>(mut self, tag: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&str) -> Vec<NodeTemplate> + Send + Sync + 'static,
    {
        self.generators.insert(tag.into(), Arc::new(generator));
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> GeneratorRegistry {
        GeneratorRegistry {
            generators: Arc::new(self.generators),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TaskSpec;

    #[test]
    fn test_register_and_resolve() {
        let registry = GeneratorRegistry::builder()
            .register("split", |result: &str| {
                result
                    .split(',')
                    .map(|part| TaskSpec::new("ai", part).into())
                    .collect()
            })
            .build();

        let generator = registry.resolve("split").unwrap();
        let children = generator("a,b,c");
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].spec, TaskSpec::new("ai", "b"));
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = GeneratorRegistry::builder().build();
        let err = registry.resolve("nope").err().unwrap();
        assert!(matches!(err, JobflowError::UnknownGenerator(ref tag) if tag == "nope"));
    }

    #[test]
    fn test_tags() {
        let registry = GeneratorRegistry::builder()
            .register("b", |_: &str| Vec::new())
            .register("a", |_: &str| Vec::new())
            .build();
        assert_eq!(registry.tags(), vec!["a".to_string(), "b".to_string()]);
        assert!(registry.contains("a"));
        assert_eq!(registry.len(), 2);
    }
}
