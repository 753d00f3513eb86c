//! Catalog of compiled-in handler implementations.
//!
//! Manifests name handler classes by `package.module:ClassName`. The catalog
//! maps those class paths to factories; a fresh instance is built on every
//! load so a reload always starts handlers from scratch.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::PluginError;
use crate::handler::PluginHandler;
use crate::manifest::ClassPath;

/// Builds a handler instance.
pub type HandlerFactory = Arc<dyn Fn() -> Arc<dyn PluginHandler> + Send + Sync>;

/// Class path → handler factory.
#[derive(Default, Clone)]
pub struct HandlerCatalog {
    entries: HashMap<String, HandlerFactory>,
}

impl std::fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCatalog")
            .field("classes", &self.class_paths())
            .finish()
    }
}

impl HandlerCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a class path.
    pub fn register<F>(&mut self, class_path: &str, factory: F) -> Result<(), PluginError>
    where
        F: Fn() -> Arc<dyn PluginHandler> + Send + Sync + 'static,
    {
        let parsed = ClassPath::parse(class_path)?;
        let key = parsed.to_string();

        if self.entries.contains_key(&key) {
            return Err(PluginError::DuplicateHandler(key));
        }

        debug!(class = %key, "Registering handler class");
        self.entries.insert(key, Arc::new(factory));
        Ok(())
    }

    /// Registers a handler instance that is shared across loads.
    pub fn register_instance(
        &mut self,
        class_path: &str,
        handler: Arc<dyn PluginHandler>,
    ) -> Result<(), PluginError> {
        self.register(class_path, move || Arc::clone(&handler))
    }

    /// Builds the handler registered for `class_path`.
    pub fn resolve(&self, class_path: &ClassPath) -> Result<Arc<dyn PluginHandler>, PluginError> {
        let key = class_path.to_string();
        let factory = self
            .entries
            .get(&key)
            .ok_or(PluginError::HandlerNotFound(key))?;
        Ok(factory())
    }

    /// Whether a class path is registered.
    pub fn contains(&self, class_path: &str) -> bool {
        self.entries.contains_key(class_path)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered class paths, sorted.
    pub fn class_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::definitions::EventType;
    use crate::handler::ClosureHandler;

    fn noop() -> Arc<dyn PluginHandler> {
        Arc::new(ClosureHandler::from_fn("noop", vec![EventType::Unknown], |_, _| {
            Ok(().into())
        }))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut catalog = HandlerCatalog::new();
        catalog.register("demo.protocols.p:Protocol", noop).unwrap();

        assert!(catalog.contains("demo.protocols.p:Protocol"));
        let class_path = ClassPath::parse("demo.protocols.p:Protocol").unwrap();
        let handler = catalog.resolve(&class_path).unwrap();
        assert_eq!(handler.responds_to(), vec![EventType::Unknown]);
    }

    #[test]
    fn test_duplicate_and_missing() {
        let mut catalog = HandlerCatalog::new();
        catalog.register("demo.p:P", noop).unwrap();

        let err = catalog.register("demo.p:P", noop).unwrap_err();
        assert!(matches!(err, PluginError::DuplicateHandler(_)));

        let err = catalog.register("not a path", noop).unwrap_err();
        assert!(matches!(err, PluginError::InvalidClassPath(_)));

        let missing = ClassPath::parse("demo.q:Q").unwrap();
        assert!(matches!(
            catalog.resolve(&missing).unwrap_err(),
            PluginError::HandlerNotFound(_)
        ));
    }
}
