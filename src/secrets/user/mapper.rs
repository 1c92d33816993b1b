//! Encoding and decoding of user secret payloads.
//!
//! A payload is decoded according to the secret's type (`opaque` for a map
//! of named strings, `string` for a single value) and encoding (`json`,
//! `yaml` or `cbor`, matched case-insensitively).

use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

use crate::secrets::engines::DocumentNode;
use crate::secrets::error::{Result, SecretError};
use crate::secrets::types::{SecretBytes, SecretString};
use crate::secrets::user::secret::UserSecretData;

/// Shape of a user secret's decrypted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserSecretType {
    Opaque,
    String,
}

impl UserSecretType {
    pub const ALL: [Self; 2] = [Self::Opaque, Self::String];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::String => "string",
        }
    }
}

impl FromStr for UserSecretType {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or_else(|| {
            SecretError::invalid_format(format!(
                "Unsupported user secret type: {}. Known user secret types: {}",
                s,
                known(Self::ALL.iter().map(Self::as_str))
            ))
        })
    }
}

impl fmt::Display for UserSecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialization format of a user secret payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserSecretEncoding {
    Json,
    Yaml,
    Cbor,
}

impl UserSecretEncoding {
    pub const ALL: [Self; 3] = [Self::Json, Self::Yaml, Self::Cbor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Cbor => "cbor",
        }
    }
}

impl FromStr for UserSecretEncoding {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|e| e.as_str().eq_ignore_ascii_case(s)).ok_or_else(|| {
            SecretError::invalid_format(format!(
                "Unsupported user secret encoding: {}. Known encoding formats: {}",
                s,
                known(Self::ALL.iter().map(Self::as_str))
            ))
        })
    }
}

impl fmt::Display for UserSecretEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn known<'a>(names: impl Iterator<Item = &'a str>) -> String {
    format!("[{}]", names.collect::<Vec<_>>().join(", "))
}

/// Converts between user secret payload bytes and [`UserSecretData`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSecretMapper;

impl UserSecretMapper {
    pub fn new() -> Self {
        Self
    }

    /// Decodes a payload using the type and encoding recorded in its metadata.
    pub fn deserialize(
        &self,
        input: &[u8],
        secret_type: &str,
        encoding: &str,
    ) -> Result<UserSecretData> {
        let secret_type: UserSecretType = secret_type.parse()?;
        let encoding: UserSecretEncoding = encoding.parse()?;

        let document = match encoding {
            UserSecretEncoding::Json => DocumentNode::from_json_slice(input)?,
            UserSecretEncoding::Yaml => DocumentNode::from_yaml_slice(input)?,
            UserSecretEncoding::Cbor => DocumentNode::from_cbor_slice(input)?,
        };

        match secret_type {
            UserSecretType::Opaque => document.into_string_map().map(UserSecretData::Opaque),
            UserSecretType::String => document.into_scalar().map(UserSecretData::String),
        }
    }

    /// Encodes secret data in the given encoding.
    pub fn serialize(&self, data: &UserSecretData, encoding: &str) -> Result<SecretBytes> {
        let encoding: UserSecretEncoding = encoding.parse()?;

        let bytes = match (data, encoding) {
            (UserSecretData::Opaque(values), UserSecretEncoding::Json) => {
                serde_json::to_vec(&exposed(values))?
            }
            (UserSecretData::Opaque(values), UserSecretEncoding::Yaml) => {
                serde_yaml::to_string(&exposed(values))?.into_bytes()
            }
            (UserSecretData::String(value), UserSecretEncoding::Json) => {
                serde_json::to_vec(value.expose_secret())?
            }
            (UserSecretData::String(value), UserSecretEncoding::Yaml) => {
                serde_yaml::to_string(value.expose_secret())?.into_bytes()
            }
            (UserSecretData::Opaque(values), UserSecretEncoding::Cbor) => {
                to_cbor(&exposed(values))?
            }
            (UserSecretData::String(value), UserSecretEncoding::Cbor) => {
                to_cbor(value.expose_secret())?
            }
        };
        Ok(SecretBytes::new(bytes))
    }
}

fn to_cbor<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .map_err(|_| SecretError::invalid_format("secret data cannot be encoded as CBOR"))?;
    Ok(bytes)
}

fn exposed(values: &IndexMap<String, SecretString>) -> IndexMap<&str, &str> {
    values.iter().map(|(name, value)| (name.as_str(), value.expose_secret())).collect()
}
