//! Secret engine registry
//!
//! Maps engine identifiers to engine instances. Populated once at startup and
//! read-only afterwards; lookups are a single hash map access.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::engine::SecretEngine;
use super::error::{Result, SecretError};
use super::reference::EncryptedSecret;
use super::types::SecretBytes;

/// Registry of secret engines keyed by identifier
#[derive(Clone, Default)]
pub struct SecretEngineRegistry {
    engines: HashMap<String, Arc<dyn SecretEngine>>,
}

impl fmt::Debug for SecretEngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretEngineRegistry")
            .field("engines", &self.registered_engines())
            .finish()
    }
}

impl SecretEngineRegistry {
    /// Create a new registry with no engines
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a list of engines
    pub fn with_engines(engines: impl IntoIterator<Item = Arc<dyn SecretEngine>>) -> Result<Self> {
        let mut registry = Self::new();
        for engine in engines {
            registry.register(engine)?;
        }
        Ok(registry)
    }

    /// Register a secret engine
    ///
    /// Fails with `DuplicateEngine` if the identifier is already taken.
    pub fn register(&mut self, engine: Arc<dyn SecretEngine>) -> Result<()> {
        let identifier = engine.identifier().to_string();
        if self.engines.contains_key(&identifier) {
            return Err(SecretError::duplicate_engine(identifier));
        }

        info!(engine = %identifier, kind = %engine.kind(), "Registering secret engine");
        self.engines.insert(identifier, engine);
        Ok(())
    }

    /// Look up an engine by identifier
    pub fn get(&self, identifier: &str) -> Option<Arc<dyn SecretEngine>> {
        self.engines.get(identifier).cloned()
    }

    /// Look up an engine by identifier, failing with `NoSuchEngine`
    pub fn engine(&self, identifier: &str) -> Result<Arc<dyn SecretEngine>> {
        self.get(identifier).ok_or_else(|| SecretError::no_such_engine(identifier))
    }

    /// Check if a secret engine is registered
    pub fn has_engine(&self, identifier: &str) -> bool {
        self.engines.contains_key(identifier)
    }

    /// Get the sorted list of registered engine identifiers
    pub fn registered_engines(&self) -> Vec<&str> {
        let mut identifiers: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        identifiers.sort_unstable();
        identifiers
    }

    /// Validate and decrypt an encrypted secret with its engine
    pub async fn decrypt(&self, secret: &EncryptedSecret) -> Result<SecretBytes> {
        let engine = self.engine(secret.engine_identifier())?;
        engine.validate(secret)?;
        debug!(engine = %engine.identifier(), "Decrypting secret");
        engine.decrypt(secret).await
    }

    /// Clear the caches of every registered engine
    pub async fn clear_caches(&self) {
        for engine in self.engines.values() {
            engine.clear_cache().await;
        }
        info!(engines = self.engines.len(), "Cleared secret engine caches");
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::engines::NoopSecretEngine;

    #[test]
    fn test_registry_creation() {
        let registry = SecretEngineRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.registered_engines().is_empty());
        assert!(registry.get("noop").is_none());
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = SecretEngineRegistry::new();
        registry.register(Arc::new(NoopSecretEngine::new())).unwrap();

        assert!(registry.has_engine("noop"));
        assert_eq!(registry.get("noop").unwrap().identifier(), "noop");
        assert_eq!(registry.registered_engines(), vec!["noop"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = SecretEngineRegistry::new();
        registry.register(Arc::new(NoopSecretEngine::new())).unwrap();

        let err = registry.register(Arc::new(NoopSecretEngine::new())).unwrap_err();
        assert_eq!(err, SecretError::duplicate_engine("noop"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_engine() {
        let registry = SecretEngineRegistry::new();
        let err = registry.engine("vault").unwrap_err();
        assert!(matches!(err, SecretError::NoSuchEngine { .. }));
    }

    #[tokio::test]
    async fn test_decrypt_dispatches_to_engine() {
        let registry =
            SecretEngineRegistry::with_engines([Arc::new(NoopSecretEngine::new()) as _]).unwrap();

        let secret = EncryptedSecret::parse("encrypted:noop!v:hunter2").unwrap();
        let value = registry.decrypt(&secret).await.unwrap();
        assert_eq!(value.expose_secret(), b"hunter2");

        let unknown = EncryptedSecret::parse("encrypted:vault!p:path").unwrap();
        assert!(matches!(
            registry.decrypt(&unknown).await,
            Err(SecretError::NoSuchEngine { .. })
        ));
    }

    #[test]
    fn test_debug_lists_engines() {
        let registry =
            SecretEngineRegistry::with_engines([Arc::new(NoopSecretEngine::new()) as _]).unwrap();
        assert!(format!("{:?}", registry).contains("noop"));
    }
}
