//! Pass-through secret engine
//!
//! The value travels inside the reference: `encrypted:noop!v:<value>` and
//! `secret://noop?v=<value>`. Useful for development and tests where no real
//! secret store is available.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::secrets::engine::{SecretEngine, SecretEngineKind};
use crate::secrets::error::{Result, SecretError};
use crate::secrets::reference::{EncryptedSecret, ENCRYPTED_STRING_PREFIX, KEY_PARAM};
use crate::secrets::types::{SecretBytes, SecretString};
use crate::secrets::user::{UserSecret, UserSecretData, UserSecretMetadata, UserSecretReference};

/// Identifier of the pass-through engine.
pub const NOOP_ENGINE_IDENTIFIER: &str = "noop";
/// Parameter carrying the value.
pub const VALUE_PARAM: &str = "v";

/// Engine that returns the value embedded in the reference.
#[derive(Debug, Clone, Default)]
pub struct NoopSecretEngine;

impl NoopSecretEngine {
    pub fn new() -> Self {
        Self
    }
}

fn missing_value() -> SecretError {
    SecretError::invalid_format(format!("Value parameter is missing ({}:...)", VALUE_PARAM))
}

#[async_trait]
impl SecretEngine for NoopSecretEngine {
    fn identifier(&self) -> &str {
        NOOP_ENGINE_IDENTIFIER
    }

    fn kind(&self) -> SecretEngineKind {
        SecretEngineKind::Opaque
    }

    fn validate(&self, secret: &EncryptedSecret) -> Result<()> {
        if secret.has_param(VALUE_PARAM) {
            Ok(())
        } else {
            Err(missing_value())
        }
    }

    async fn decrypt(&self, secret: &EncryptedSecret) -> Result<SecretBytes> {
        let value = secret.param(VALUE_PARAM).ok_or_else(missing_value)?;
        Ok(SecretBytes::new(value.as_bytes()))
    }

    async fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret> {
        EncryptedSecret::parse(&format!(
            "{}{}!{}:{}",
            ENCRYPTED_STRING_PREFIX, NOOP_ENGINE_IDENTIFIER, VALUE_PARAM, plaintext
        ))
        .map_err(|_| {
            SecretError::invalid_format("value cannot be embedded in a reference (empty or '!')")
        })
    }

    fn validate_user_secret(&self, reference: &UserSecretReference) -> Result<()> {
        if reference.parameter(VALUE_PARAM).is_some() {
            Ok(())
        } else {
            Err(missing_value())
        }
    }

    async fn decrypt_user_secret(&self, reference: &UserSecretReference) -> Result<UserSecret> {
        let values: IndexMap<String, SecretString> = reference
            .parameters()
            .iter()
            .filter(|(name, _)| name.as_str() != KEY_PARAM)
            .map(|(name, value)| (name.clone(), SecretString::new(value.as_str())))
            .collect();

        Ok(UserSecret::new(UserSecretMetadata::new("opaque", ""), UserSecretData::Opaque(values)))
    }
}
