//! Secret engine trait and types
//!
//! Defines the interface every pluggable secret engine implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{Result, SecretError};
use super::reference::EncryptedSecret;
use super::types::SecretBytes;
use super::user::{UserSecret, UserSecretReference};

/// Broad category of a secret engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretEngineKind {
    /// Fetches whole files from an object store and extracts fields from them
    Storage,
    /// Returns values carried in the reference itself
    Opaque,
    /// Anything else, such as a dedicated secrets manager
    Other,
}

impl SecretEngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Opaque => "opaque",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SecretEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for secret engines
///
/// Implementations must be Send + Sync; a single engine instance is shared by
/// every caller resolving references with its identifier.
#[async_trait]
pub trait SecretEngine: Send + Sync + fmt::Debug {
    /// Identifier used as `<engine>` in secret references
    fn identifier(&self) -> &str;

    fn kind(&self) -> SecretEngineKind {
        SecretEngineKind::Other
    }

    /// Check that an encrypted secret has the parameters this engine needs
    ///
    /// Fails with `InvalidFormat` when it does not.
    fn validate(&self, secret: &EncryptedSecret) -> Result<()>;

    /// Resolve an encrypted secret to its plaintext bytes
    async fn decrypt(&self, secret: &EncryptedSecret) -> Result<SecretBytes>;

    /// Produce an encrypted secret reference for a plaintext value
    async fn encrypt(&self, _plaintext: &str) -> Result<EncryptedSecret> {
        Err(SecretError::unsupported(self.identifier(), "encrypt"))
    }

    /// Check that a user secret reference has the parameters this engine needs
    fn validate_user_secret(&self, _reference: &UserSecretReference) -> Result<()> {
        Err(SecretError::unsupported(self.identifier(), "user secrets"))
    }

    /// Resolve a user secret reference
    async fn decrypt_user_secret(&self, _reference: &UserSecretReference) -> Result<UserSecret> {
        Err(SecretError::unsupported(self.identifier(), "user secrets"))
    }

    /// Drop anything the engine has cached
    async fn clear_cache(&self) {}
}
