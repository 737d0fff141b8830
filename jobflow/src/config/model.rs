//! Run configuration model.

use crate::core::{NodeTemplate, Successors, TaskSpec};
use crate::generators::builtin::AI_FOLLOWUPS;
use crate::handlers::builtin::{AI, BLOCKCHAIN, DOWNLOAD, STORAGE};
use crate::pipeline::{BackoffPolicy, FailureAccounting, RetryPolicy, DEFAULT_BASE_DELAY_MS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration of one scheduler run.
///
/// Read-only once scheduling begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum number of nodes running at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Optional backoff cap in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    /// Children deeper than this are not submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,

    /// Failure counter semantics.
    #[serde(default)]
    pub failure_accounting: FailureAccounting,

    /// Flat list of root tasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskSpec>,

    /// Nested tree of root nodes.
    #[serde(default, alias = "roots", skip_serializing_if = "Vec::is_empty")]
    pub pipeline: Vec<NodeConfig>,
}

fn default_max_concurrency() -> usize {
    3
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: None,
            max_depth: None,
            failure_accounting: FailureAccounting::default(),
            tasks: Vec::new(),
            pipeline: Vec::new(),
        }
    }
}

impl RunConfig {
    /// The configuration used when none is supplied.
    ///
    /// One task per built-in handler compiled into this build. The `ai` root
    /// feeds the follow-up generators, so the depth limit keeps that cycle
    /// finite.
    #[must_use]
    pub fn example() -> Self {
        let mut tasks = Vec::new();
        if cfg!(feature = "http") {
            tasks.push(TaskSpec::new(DOWNLOAD, "https://httpbin.org/get"));
        }
        tasks.push(TaskSpec::new(BLOCKCHAIN, "0xContractAddress:mintNFT"));
        tasks.push(TaskSpec::new(STORAGE, "/tmp/sample.txt"));

        Self::default()
            .with_max_depth(4)
            .with_tasks(tasks)
            .with_pipeline(vec![NodeConfig::new(AI, "Generate AI text for Web4 article")
                .with_generator(AI_FOLLOWUPS)])
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub const fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base backoff delay.
    #[must_use]
    pub const fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Caps the backoff delay.
    #[must_use]
    pub const fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = Some(max_delay_ms);
        self
    }

    /// Limits successor depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the failure accounting mode.
    #[must_use]
    pub const fn with_failure_accounting(mut self, accounting: FailureAccounting) -> Self {
        self.failure_accounting = accounting;
        self
    }

    /// Sets the flat root tasks.
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<TaskSpec>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Sets the nested root nodes.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: Vec<NodeConfig>) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Sets the nested root nodes from templates.
    #[must_use]
    pub fn with_roots(self, roots: Vec<NodeTemplate>) -> Self {
        self.with_pipeline(roots.into_iter().map(NodeConfig::from).collect())
    }

    /// Returns the retry policy described by this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut backoff = BackoffPolicy::new(self.base_delay_ms);
        if let Some(max) = self.max_delay_ms {
            backoff = backoff.with_max_delay_ms(max);
        }
        RetryPolicy::new()
            .with_max_retries(self.max_retries)
            .with_backoff(backoff)
            .with_failure_accounting(self.failure_accounting)
    }

    /// Returns the root templates: flat tasks first, then the nested tree.
    #[must_use]
    pub fn root_templates(&self) -> Vec<NodeTemplate> {
        self.tasks
            .iter()
            .cloned()
            .map(NodeTemplate::new)
            .chain(self.pipeline.iter().map(NodeConfig::to_template))
            .collect()
    }

    /// Returns the number of root nodes.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.tasks.len() + self.pipeline.len()
    }
}

/// Explicit node id. JSON configs may use strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    /// A numeric id.
    Number(i64),
    /// A string id.
    Text(String),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for NodeKey {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<i64> for NodeKey {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

/// One node of the nested configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Optional explicit id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeKey>,

    /// Task-type tag.
    #[serde(rename = "type")]
    pub task_type: String,

    /// Handler payload.
    #[serde(default)]
    pub payload: String,

    /// Static children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next: Vec<NodeConfig>,

    /// Successor generator tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

impl NodeConfig {
    /// Creates a leaf node.
    #[must_use]
    pub fn new(task_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: None,
            task_type: task_type.into(),
            payload: payload.into(),
            next: Vec::new(),
            generator: None,
        }
    }

    /// Sets an explicit id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<NodeKey>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets static children.
    #[must_use]
    pub fn with_next(mut self, next: Vec<Self>) -> Self {
        self.next = next;
        self
    }

    /// Sets the successor generator.
    #[must_use]
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    /// Returns the id if set, else the task type. Used in error messages.
    #[must_use]
    pub fn label(&self) -> String {
        self.id
            .as_ref()
            .map_or_else(|| self.task_type.clone(), ToString::to_string)
    }

    /// Converts the subtree into a node template.
    ///
    /// A generator takes precedence over static children; validation rejects
    /// nodes that declare both.
    #[must_use]
    pub fn to_template(&self) -> NodeTemplate {
        let successors = match (&self.generator, self.next.is_empty()) {
            (Some(generator), _) => Successors::Generated(generator.clone()),
            (None, false) => Successors::Static(self.next.iter().map(Self::to_template).collect()),
            (None, true) => Successors::None,
        };
        NodeTemplate {
            id: self.id.as_ref().map(ToString::to_string),
            spec: TaskSpec::new(self.task_type.clone(), self.payload.clone()),
            successors,
        }
    }
}

impl From<NodeTemplate> for NodeConfig {
    fn from(template: NodeTemplate) -> Self {
        let mut config = Self::new(template.spec.task_type, template.spec.payload);
        config.id = template.id.map(NodeKey::Text);
        match template.successors {
            Successors::None => {}
            Successors::Static(children) => {
                config.next = children.into_iter().map(Self::from).collect();
            }
            Successors::Generated(generator) => config.generator = Some(generator),
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_delay_ms, 500);
        assert!(config.root_templates().is_empty());
    }

    #[test]
    fn test_flat_tasks() {
        let config: RunConfig = serde_json::from_str(
            r#"{"max_concurrency": 5, "max_retries": 0,
                "tasks": [{"type": "ai", "payload": "hi"}, {"type": "storage", "payload": "/f"}]}"#,
        )
        .unwrap();

        assert_eq!(config.max_concurrency, 5);
        let roots = config.root_templates();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].spec, TaskSpec::new("ai", "hi"));
        assert_eq!(roots[1].successors, Successors::None);
    }

    #[test]
    fn test_nested_tree_with_numeric_and_string_ids() {
        let config: RunConfig = serde_json::from_str(
            r#"{"roots": [
                {"id": 1, "type": "download", "payload": "u",
                 "next": [{"id": "two", "type": "ai", "payload": "p", "generator": "ai_followups"}]}
            ]}"#,
        )
        .unwrap();

        let roots = config.root_templates();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id.as_deref(), Some("1"));
        let Successors::Static(children) = &roots[0].successors else {
            panic!("expected static successors");
        };
        assert_eq!(children[0].id.as_deref(), Some("two"));
        assert_eq!(
            children[0].successors,
            Successors::Generated("ai_followups".to_string())
        );
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = RunConfig::default()
            .with_max_retries(4)
            .with_base_delay_ms(10)
            .with_max_delay_ms(50)
            .with_failure_accounting(FailureAccounting::PerNode);

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.backoff, BackoffPolicy::new(10).with_max_delay_ms(50));
        assert_eq!(policy.failure_accounting, FailureAccounting::PerNode);
    }

    #[test]
    fn test_template_conversion_preserves_tree() {
        let template = NodeTemplate::new(TaskSpec::new("a", "x"))
            .with_id("root")
            .then(vec![NodeTemplate::new(TaskSpec::new("b", "y")).generated_by("g")]);

        let config = NodeConfig::from(template.clone());
        assert_eq!(config.next[0].generator.as_deref(), Some("g"));
        assert_eq!(config.to_template(), template);
    }

    #[test]
    fn test_example_config() {
        let config = RunConfig::example();
        let mut expected = vec![BLOCKCHAIN, STORAGE, AI];
        if cfg!(feature = "http") {
            expected.insert(0, DOWNLOAD);
        }
        assert_eq!(config.root_count(), expected.len());
        assert_eq!(config.max_depth, Some(4));
        let types: Vec<String> = config
            .root_templates()
            .into_iter()
            .map(|t| t.spec.task_type)
            .collect();
        assert_eq!(types, expected);
    }

    #[test]
    fn test_example_roots_have_builtin_handlers() {
        let handlers = crate::handlers::registry_with(&crate::handlers::BuiltinOptions::instant());
        for template in RunConfig::example().root_templates() {
            assert!(
                handlers.contains(&template.spec.task_type),
                "no built-in handler for example root {}",
                template.spec.task_type
            );
        }
    }
}
