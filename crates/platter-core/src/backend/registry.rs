//! Backend registry -- a named collection of available model backends.
//!
//! Which backend is active is external configuration: the CLI builds the
//! configured adapter and the pipeline looks it up by name at runtime.

use std::collections::HashMap;

use super::trait_def::ModelBackend;

/// A collection of registered [`ModelBackend`] implementations, keyed by
/// name.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn ModelBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend adapter under the name returned by
    /// [`ModelBackend::name`]. If a backend with the same name is already
    /// registered, it is replaced and the old one is returned.
    pub fn register(&mut self, backend: impl ModelBackend + 'static) -> Option<Box<dyn ModelBackend>> {
        let name = backend.name().to_string();
        self.backends.insert(name, Box::new(backend))
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> Option<&dyn ModelBackend> {
        self.backends.get(name).map(|b| b.as_ref())
    }

    /// List the names of all registered backends.
    pub fn list(&self) -> Vec<&str> {
        self.backends.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::trait_def::{BackendError, GenerateRequest};
    use async_trait::async_trait;

    struct FakeBackend {
        backend_name: String,
    }

    impl FakeBackend {
        fn new(name: &str) -> Self {
            Self {
                backend_name: name.to_string(),
            }
        }
    }

    #[async_trait]
    impl ModelBackend for FakeBackend {
        fn name(&self) -> &str {
            &self.backend_name
        }

        async fn generate(&self, _request: &GenerateRequest) -> Result<String, BackendError> {
            Ok("{}".to_string())
        }
    }

    #[test]
    fn registry_starts_empty() {
        let registry = BackendRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.list().is_empty());
    }

    #[test]
    fn register_and_get() {
        let mut registry = BackendRegistry::new();
        assert!(registry.register(FakeBackend::new("alpha")).is_none());

        let backend = registry.get("alpha");
        assert!(backend.is_some());
        assert_eq!(backend.unwrap().name(), "alpha");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn register_replaces_existing() {
        let mut registry = BackendRegistry::new();
        registry.register(FakeBackend::new("alpha"));
        let old = registry.register(FakeBackend::new("alpha"));
        assert!(old.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_returns_all_names() {
        let mut registry = BackendRegistry::new();
        registry.register(FakeBackend::new("openai"));
        registry.register(FakeBackend::new("ollama"));
        registry.register(FakeBackend::new("builtin"));

        let mut names = registry.list();
        names.sort();
        assert_eq!(names, vec!["builtin", "ollama", "openai"]);
    }
}
