//! User secret access with per-resource tracking.
//!
//! Resources (accounts, pipelines, anything with an id) that read user
//! secrets are recorded in a ledger so that access checks can be repeated at
//! time of use. Entries live until [`UserSecretService::stop_tracking_resource`]
//! is called for the resource.

use dashmap::{DashMap, DashSet};
use tracing::debug;

use crate::secrets::error::{Result, SecretError};
use crate::secrets::reference::EncryptedSecret;
use crate::secrets::types::SecretString;
use crate::secrets::user::manager::UserSecretManager;
use crate::secrets::user::reference::{UserSecretReference, SECRET_URI_SCHEME};
use crate::secrets::user::secret::UserSecret;

/// Entry point for resolving user and external secrets on behalf of resources.
#[derive(Debug)]
pub struct UserSecretService {
    manager: UserSecretManager,
    resources: DashMap<String, DashSet<UserSecretReference>>,
}

impl UserSecretService {
    pub fn new(manager: UserSecretManager) -> Self {
        Self { manager, resources: DashMap::new() }
    }

    pub fn manager(&self) -> &UserSecretManager {
        &self.manager
    }

    /// Fetches and decrypts a user secret without tracking it.
    pub async fn get_user_secret(&self, reference: &UserSecretReference) -> Result<UserSecret> {
        self.manager.get_user_secret(reference).await
    }

    /// Returns the string value of a user secret and records that
    /// `resource_id` uses it.
    ///
    /// The `k` parameter selects the field; without it the whole value is
    /// used, which only a string secret can provide.
    pub async fn get_user_secret_string_for_resource(
        &self,
        reference: &UserSecretReference,
        resource_id: &str,
    ) -> Result<SecretString> {
        let secret = self.manager.get_user_secret(reference).await?;
        let key = reference.secret_key().unwrap_or_default();
        let value = secret.secret_string(key).cloned().ok_or_else(|| {
            SecretError::no_such_field(
                format!("{}{}", SECRET_URI_SCHEME, reference.engine_identifier()),
                key,
            )
        })?;

        self.resources.entry(resource_id.to_string()).or_default().insert(reference.clone());
        debug!(
            resource_id = %resource_id,
            engine = %reference.engine_identifier(),
            "Tracking user secret for resource"
        );
        Ok(value)
    }

    /// Whether any user secret has been resolved for `resource_id`.
    pub fn is_tracking_user_secrets_for_resource(&self, resource_id: &str) -> bool {
        self.resources.contains_key(resource_id)
    }

    /// References resolved for `resource_id` so far.
    pub fn tracked_user_secrets(&self, resource_id: &str) -> Vec<UserSecretReference> {
        self.resources
            .get(resource_id)
            .map(|references| references.iter().map(|r| r.key().clone()).collect())
            .unwrap_or_default()
    }

    /// Resolves every tracked user secret of `resource_id` and hands it to `action`.
    ///
    /// Stops at the first secret that fails to resolve.
    pub async fn for_each_user_secret_of_resource<F>(
        &self,
        resource_id: &str,
        mut action: F,
    ) -> Result<()>
    where
        F: FnMut(&UserSecretReference, &UserSecret),
    {
        for reference in self.tracked_user_secrets(resource_id) {
            let secret = self.manager.get_user_secret(&reference).await?;
            action(&reference, &secret);
        }
        Ok(())
    }

    /// Forgets every user secret recorded for `resource_id`.
    ///
    /// Returns whether the resource was tracked.
    pub fn stop_tracking_resource(&self, resource_id: &str) -> bool {
        let removed = self.resources.remove(resource_id).is_some();
        if removed {
            debug!(resource_id = %resource_id, "Stopped tracking user secrets for resource");
        }
        removed
    }

    /// Fetches an external secret, discarding the value. Fails if the
    /// reference is invalid, has no engine or cannot be fetched.
    pub async fn check_external_secret(&self, reference: &EncryptedSecret) -> Result<()> {
        self.manager.get_external_secret(reference).await.map(drop)
    }

    /// Fetches an external secret as UTF-8 text.
    pub async fn get_external_secret_string(
        &self,
        reference: &EncryptedSecret,
    ) -> Result<SecretString> {
        self.manager.get_external_secret_string(reference).await
    }
}
