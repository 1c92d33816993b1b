//! Decrypted user secrets and their metadata.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::secrets::types::SecretString;

/// Descriptive metadata stored alongside a user secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSecretMetadata {
    /// Secret type discriminator such as `opaque` or `string`.
    #[serde(rename = "type")]
    pub secret_type: String,
    /// Payload encoding such as `json` or `yaml`.
    #[serde(default)]
    pub encoding: String,
    /// Roles authorized to use the secret.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserSecretMetadata {
    pub fn new(secret_type: impl Into<String>, encoding: impl Into<String>) -> Self {
        Self { secret_type: secret_type.into(), encoding: encoding.into(), roles: Vec::new() }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

/// The decrypted payload of a user secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSecretData {
    /// Named string values.
    Opaque(IndexMap<String, SecretString>),
    /// A single string value.
    String(SecretString),
}

impl UserSecretData {
    /// Returns the value for `key`.
    ///
    /// A string secret has a single value and ignores the key; an opaque
    /// secret looks the key up among its fields.
    pub fn secret_string(&self, key: &str) -> Option<&SecretString> {
        match self {
            Self::Opaque(values) => values.get(key),
            Self::String(value) => Some(value),
        }
    }

    /// Name of the user secret type this data belongs to.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Opaque(_) => "opaque",
            Self::String(_) => "string",
        }
    }
}

/// A decrypted user secret.
///
/// Created fresh by each decrypt; the holder owns disposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSecret {
    metadata: UserSecretMetadata,
    data: UserSecretData,
}

impl UserSecret {
    pub fn new(metadata: UserSecretMetadata, data: UserSecretData) -> Self {
        Self { metadata, data }
    }

    pub fn metadata(&self) -> &UserSecretMetadata {
        &self.metadata
    }

    pub fn data(&self) -> &UserSecretData {
        &self.data
    }

    pub fn secret_type(&self) -> &str {
        &self.metadata.secret_type
    }

    pub fn encoding(&self) -> &str {
        &self.metadata.encoding
    }

    pub fn roles(&self) -> &[String] {
        &self.metadata.roles
    }

    pub fn secret_string(&self, key: &str) -> Option<&SecretString> {
        self.data.secret_string(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_secret_ignores_key() {
        let secret = UserSecret::new(
            UserSecretMetadata::new("string", "json"),
            UserSecretData::String(SecretString::new("super-secret")),
        );

        assert_eq!(secret.secret_string("").unwrap().expose_secret(), "super-secret");
        assert_eq!(secret.secret_string("anything").unwrap().expose_secret(), "super-secret");
    }

    #[test]
    fn test_opaque_secret_looks_up_fields() {
        let mut values = IndexMap::new();
        values.insert("username".to_string(), SecretString::new("admin"));
        values.insert("password".to_string(), SecretString::new("hunter2"));
        let secret = UserSecret::new(
            UserSecretMetadata::new("opaque", "yaml").with_roles(["ops"]),
            UserSecretData::Opaque(values),
        );

        assert_eq!(secret.secret_string("password").unwrap().expose_secret(), "hunter2");
        assert!(secret.secret_string("missing").is_none());
        assert!(secret.secret_string("").is_none());
        assert_eq!(secret.roles(), ["ops".to_string()]);
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let secret = UserSecret::new(
            UserSecretMetadata::new("string", "json"),
            UserSecretData::String(SecretString::new("super-secret")),
        );
        assert!(!format!("{:?}", secret).contains("super-secret"));
    }

    #[test]
    fn test_metadata_deserializes_with_defaults() {
        let metadata: UserSecretMetadata = serde_json::from_str(r#"{"type": "opaque"}"#).unwrap();
        assert_eq!(metadata.secret_type, "opaque");
        assert!(metadata.encoding.is_empty());
        assert!(metadata.roles.is_empty());
    }
}
