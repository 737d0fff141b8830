//! Handler registry.

use crate::errors::{HandlerError, JobflowError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// The capability behind one task type.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Runs the task with its payload.
    ///
    /// # Returns
    ///
    /// The handler's result on success. Errors are retried by the engine up
    /// to the configured budget.
    async fn handle(&self, payload: &str) -> Result<String, HandlerError>;
}

/// Adapter that turns an async closure into a [`TaskHandler`].
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    /// Wraps a closure taking the owned payload.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> TaskHandler for FnHandler<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, HandlerError>> + Send,
{
    async fn handle(&self, payload: &str) -> Result<String, HandlerError> {
        (self.func)(payload.to_string()).await
    }
}

/// Immutable mapping from task-type tag to handler.
///
/// Built once through [`HandlerRegistryBuilder`] before scheduling starts.
/// Cloning is cheap and shares the same map; there is no way to add or
/// remove a handler afterwards.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<HashMap<String, Arc<dyn TaskHandler>>>,
}

impl HandlerRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Resolves a tag to its handler.
    pub fn resolve(&self, task_type: &str) -> Result<Arc<dyn TaskHandler>, JobflowError> {
        self.handlers
            .get(task_type)
            .cloned()
            .ok_or_else(|| JobflowError::UnknownTaskType(task_type.to_string()))
    }

    /// Returns true if a handler is registered for the tag.
    #[must_use]
    pub fn contains(&self, task_type: &str) -> bool {
        self.handlers.contains_key(task_type)
    }

    /// Lists registered tags in sorted order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.handlers.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Collects handlers before the registry is frozen.
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistryBuilder {
    /// Registers a handler. A later registration for the same tag wins.
    #[must_use]
    pub fn register(self, task_type: impl Into<String>, handler: impl TaskHandler + 'static) -> Self {
        self.register_arc(task_type, Arc::new(handler))
    }

    /// Registers a shared handler.
    #[must_use]
    pub fn register_arc(mut self, task_type: impl Into<String>, handler: Arc<dyn TaskHandler>) -> Self {
        let task_type = task_type.into();
        if self.handlers.insert(task_type.clone(), handler).is_some() {
            debug!(task_type = %task_type, "Replacing previously registered handler");
        }
        self
    }

    /// Registers an async closure as a handler.
    #[must_use]
    pub fn register_fn<F, Fut>(self, task_type: impl Into<String>, func: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, HandlerError>> + Send + 'static,
    {
        self.register(task_type, FnHandler::new(func))
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: Arc::new(self.handlers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = HandlerRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.tags().is_empty());
    }

    #[tokio::test]
    async fn test_register_and_resolve_fn() {
        let registry = HandlerRegistry::builder()
            .register_fn("echo", |payload| async move { Ok(payload) })
            .build();

        assert!(registry.contains("echo"));
        let handler = registry.resolve("echo").unwrap();
        assert_eq!(handler.handle("hello").await.unwrap(), "hello");
    }

    #[test]
    fn test_resolve_unknown_tag() {
        let registry = HandlerRegistry::builder()
            .register_fn("echo", |payload| async move { Ok(payload) })
            .build();

        let err = registry.resolve("mint").err().unwrap();
        assert!(matches!(err, JobflowError::UnknownTaskType(ref tag) if tag == "mint"));
    }

    #[tokio::test]
    async fn test_later_registration_wins() {
        let registry = HandlerRegistry::builder()
            .register_fn("x", |_| async { Ok("first".to_string()) })
            .register_fn("x", |_| async { Ok("second".to_string()) })
            .build();

        assert_eq!(registry.len(), 1);
        let handler = registry.resolve("x").unwrap();
        assert_eq!(handler.handle("").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_mock_handler_is_resolved() {
        let mut mock = MockTaskHandler::new();
        mock.expect_handle()
            .withf(|payload: &str| payload == "0xContract:mint")
            .times(1)
            .returning(|_| Err(HandlerError::new("tx reverted")));

        let registry = HandlerRegistry::builder().register("blockchain", mock).build();
        let err = registry
            .resolve("blockchain")
            .unwrap()
            .handle("0xContract:mint")
            .await
            .unwrap_err();
        assert_eq!(err.message, "tx reverted");
    }

    #[test]
    fn test_tags_sorted_and_clone_shares_map() {
        let registry = HandlerRegistry::builder()
            .register_fn("storage", |p| async move { Ok(p) })
            .register_fn("ai", |p| async move { Ok(p) })
            .build();
        let clone = registry.clone();

        assert_eq!(clone.tags(), vec!["ai".to_string(), "storage".to_string()]);
        assert!(Arc::ptr_eq(&registry.handlers, &clone.handlers));
    }
}
