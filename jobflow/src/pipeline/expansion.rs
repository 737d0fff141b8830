//! Successor expansion.

use crate::core::{NodeTemplate, PipelineNode, Successors};
use crate::generators::GeneratorRegistry;
use tracing::{debug, warn};

/// Turns a succeeded node and its result into child nodes.
#[derive(Debug, Clone, Default)]
pub struct SuccessorExpander {
    generators: GeneratorRegistry,
}

impl SuccessorExpander {
    /// Creates an expander resolving generators through `generators`.
    #[must_use]
    pub const fn new(generators: GeneratorRegistry) -> Self {
        Self { generators }
    }

    /// Returns the children of `parent`, given the result it succeeded with.
    ///
    /// Static children keep their configured ids. Generated children always
    /// get fresh ids, and so do the static subtrees a generator attaches to
    /// them. An unknown generator tag makes the node a leaf.
    #[must_use]
    pub fn expand(&self, parent: &PipelineNode, result: &str) -> Vec<PipelineNode> {
        let templates: Vec<NodeTemplate> = match parent.successors() {
            Successors::None => return Vec::new(),
            Successors::Static(children) => children.clone(),
            Successors::Generated(tag) => match self.generators.resolve(tag) {
                Ok(generator) => generator(result)
                    .into_iter()
                    .map(NodeTemplate::without_ids)
                    .collect(),
                Err(err) => {
                    warn!(node_id = %parent.id(), error = %err, "Treating node as leaf");
                    return Vec::new();
                }
            },
        };

        let children: Vec<PipelineNode> = templates
            .into_iter()
            .map(|template| PipelineNode::child_of(parent, template))
            .collect();
        debug!(
            node_id = %parent.id(),
            children = children.len(),
            depth = parent.depth() + 1,
            "Expanded successors"
        );
        children
    }
}
