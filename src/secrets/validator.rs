//! Validation of secret references embedded in configuration values.

use std::sync::Arc;
use tracing::{debug, info};

use super::error::SecretError;
use super::reference::EncryptedSecret;
use super::user::{UserSecretReference, UserSecretService, SECRET_URI_SCHEME};

/// Checks that strings which look like secret references actually resolve.
#[derive(Debug, Clone)]
pub struct SecretReferenceValidator {
    service: Arc<UserSecretService>,
}

impl SecretReferenceValidator {
    pub fn new(service: Arc<UserSecretService>) -> Self {
        Self { service }
    }

    /// Validates `text` if it is a secret reference.
    ///
    /// Returns `None` when the reference resolves or when `text` is not a
    /// well-formed `secret://` or `encrypted:` reference at all.
    pub async fn validate(&self, text: &str) -> Option<SecretError> {
        if UserSecretReference::is_user_secret(text) {
            return self.validate_user_secret_reference(text).await;
        }
        if EncryptedSecret::is_encrypted_secret(text) {
            return self.validate_external_secret_reference(text).await;
        }
        None
    }

    /// Parses and resolves a user secret URI, checking the `k` field exists.
    pub async fn validate_user_secret_reference(&self, uri: &str) -> Option<SecretError> {
        let result = async {
            let reference = UserSecretReference::parse(uri)?;
            debug!(engine = %reference.engine_identifier(), "Validating user secret reference");
            let secret = self.service.get_user_secret(&reference).await?;
            if let Some(key) = reference.secret_key() {
                if secret.secret_string(key).is_none() {
                    return Err(SecretError::no_such_field(
                        format!("{}{}", SECRET_URI_SCHEME, reference.engine_identifier()),
                        key,
                    ));
                }
            }
            Ok::<(), SecretError>(())
        }
        .await;

        result.err().inspect(|error| {
            info!(error_code = error.error_code(), "User secret reference failed validation");
        })
    }

    /// Parses an encrypted secret URI and checks that its data can be fetched.
    pub async fn validate_external_secret_reference(&self, uri: &str) -> Option<SecretError> {
        let result = async {
            let reference = EncryptedSecret::parse(uri)?;
            debug!(
                engine = %reference.engine_identifier(),
                "Validating external secret reference"
            );
            self.service.check_external_secret(&reference).await
        }
        .await;

        result.err().inspect(|error| {
            info!(error_code = error.error_code(), "External secret reference failed validation");
        })
    }
}
