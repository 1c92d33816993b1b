//! Resolution of user and external secrets through the engine registry.

use std::sync::Arc;
use tracing::Instrument;

use crate::secrets::cache::{CacheSettings, SecretCache};
use crate::secrets::error::Result;
use crate::secrets::reference::EncryptedSecret;
use crate::secrets::registry::SecretEngineRegistry;
use crate::secrets::types::{SecretBytes, SecretString};
use crate::secrets::user::reference::UserSecretReference;
use crate::secrets::user::secret::UserSecret;

/// Fetches and decrypts secrets, caching user secrets per reference.
#[derive(Debug, Clone)]
pub struct UserSecretManager {
    registry: Arc<SecretEngineRegistry>,
    cache: SecretCache<UserSecretReference, UserSecret>,
}

impl UserSecretManager {
    pub fn new(registry: Arc<SecretEngineRegistry>, settings: CacheSettings) -> Self {
        Self { registry, cache: SecretCache::new(settings) }
    }

    /// Create a manager with the default user secret cache limits
    pub fn with_default_cache(registry: Arc<SecretEngineRegistry>) -> Self {
        Self::new(registry, CacheSettings::user_secrets())
    }

    pub fn registry(&self) -> &SecretEngineRegistry {
        &self.registry
    }

    /// Fetches and decrypts a user secret.
    ///
    /// Fails with `NoSuchEngine` when no engine has the reference's identifier.
    pub async fn get_user_secret(&self, reference: &UserSecretReference) -> Result<UserSecret> {
        let engine = self.registry.engine(reference.engine_identifier())?;
        let span = crate::secret_span!("decrypt_user_secret", engine.identifier());
        let owned = reference.clone();

        self.cache
            .get_or_compute(reference.clone(), move || {
                async move {
                    engine.validate_user_secret(&owned)?;
                    engine.decrypt_user_secret(&owned).await
                }
                .instrument(span)
            })
            .await
    }

    /// Fetches and decrypts an external secret. These are not cached here;
    /// storage engines keep their own file cache.
    pub async fn get_external_secret(&self, reference: &EncryptedSecret) -> Result<SecretBytes> {
        let span = crate::secret_span!("decrypt_external_secret", reference.engine_identifier());
        self.registry.decrypt(reference).instrument(span).await
    }

    /// Fetches and decrypts an external secret as UTF-8 text.
    pub async fn get_external_secret_string(
        &self,
        reference: &EncryptedSecret,
    ) -> Result<SecretString> {
        self.get_external_secret(reference).await?.into_secret_string()
    }

    /// Drop all cached user secrets
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
