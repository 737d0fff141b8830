//! Pipeline nodes and successor policies.

use super::TaskSpec;
use crate::utils::generate_node_id;

/// Unique identifier of a submitted node.
pub type NodeId = String;

/// What a node produces after it succeeds.
///
/// Exactly one policy is active per node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Successors {
    /// Leaf node.
    #[default]
    None,
    /// A fixed list of children, emitted unconditionally on success.
    Static(Vec<NodeTemplate>),
    /// A generator tag, resolved through the generator registry and invoked
    /// once with the node's result.
    Generated(String),
}

/// A node that has not been submitted yet.
///
/// Templates are what configuration trees and successor generators produce.
/// They become [`PipelineNode`]s with a concrete id on submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTemplate {
    /// Optional caller-supplied id. A fresh id is generated when absent.
    pub id: Option<String>,
    /// The task to run.
    pub spec: TaskSpec,
    /// The successor policy.
    pub successors: Successors,
}

impl NodeTemplate {
    /// Creates a leaf template.
    #[must_use]
    pub fn new(spec: TaskSpec) -> Self {
        Self {
            id: None,
            spec,
            successors: Successors::None,
        }
    }

    /// Sets an explicit id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets a static list of children.
    #[must_use]
    pub fn then(mut self, children: Vec<NodeTemplate>) -> Self {
        self.successors = Successors::Static(children);
        self
    }

    /// Binds a successor generator by tag.
    #[must_use]
    pub fn generated_by(mut self, generator: impl Into<String>) -> Self {
        self.successors = Successors::Generated(generator.into());
        self
    }

    /// Clears the id of this template and of every static descendant.
    #[must_use]
    pub fn without_ids(self) -> Self {
        let successors = match self.successors {
            Successors::Static(children) => {
                Successors::Static(children.into_iter().map(Self::without_ids).collect())
            }
            other => other,
        };
        Self {
            id: None,
            spec: self.spec,
            successors,
        }
    }
}

impl From<TaskSpec> for NodeTemplate {
    fn from(spec: TaskSpec) -> Self {
        Self::new(spec)
    }
}

/// A submitted unit of the task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineNode {
    id: NodeId,
    spec: TaskSpec,
    successors: Successors,
    depth: u32,
    parent: Option<NodeId>,
}

impl PipelineNode {
    /// Creates a root node from a template.
    #[must_use]
    pub fn root(template: NodeTemplate) -> Self {
        Self::from_template(template, 0, None)
    }

    /// Creates a child of `parent` from a template.
    #[must_use]
    pub fn child_of(parent: &Self, template: NodeTemplate) -> Self {
        Self::from_template(template, parent.depth + 1, Some(parent.id.clone()))
    }

    fn from_template(template: NodeTemplate, depth: u32, parent: Option<NodeId>) -> Self {
        Self {
            id: template.id.unwrap_or_else(generate_node_id),
            spec: template.spec,
            successors: template.successors,
            depth,
            parent,
        }
    }

    /// Returns the node id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the task spec.
    #[must_use]
    pub const fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    /// Returns the task-type tag.
    #[must_use]
    pub fn task_type(&self) -> &str {
        &self.spec.task_type
    }

    /// Returns the payload.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.spec.payload
    }

    /// Returns the successor policy.
    #[must_use]
    pub const fn successors(&self) -> &Successors {
        &self.successors
    }

    /// Returns the generation depth (0 for roots).
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns the id of the node that produced this one.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}
