//! Structured secret documents.
//!
//! Secret files are decoded into a closed tree of scalars, mappings,
//! sequences and nulls. A dotted path selects one scalar: mapping segments
//! are field names and sequence segments are zero-based indexes.

use indexmap::IndexMap;

use crate::secrets::error::{Result, SecretError};
use crate::secrets::types::SecretString;

/// A decoded YAML, JSON or CBOR document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentNode {
    /// Any string, number or boolean, kept as its textual form.
    Scalar(String),
    Mapping(IndexMap<String, DocumentNode>),
    Sequence(Vec<DocumentNode>),
    Null,
}

impl DocumentNode {
    /// Decodes a YAML document. JSON documents are accepted as well.
    pub fn from_yaml_slice(bytes: &[u8]) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
        Ok(Self::from(value))
    }

    /// Decodes a CBOR data item.
    pub fn from_cbor_slice(bytes: &[u8]) -> Result<Self> {
        let value: ciborium::Value = ciborium::de::from_reader(bytes)?;
        Ok(Self::from(value))
    }

    /// Decodes a JSON document.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Ok(Self::from(value))
    }

    /// Returns the scalar at the dotted `path`.
    pub fn extract(&self, path: &str) -> Result<&str> {
        let mut node = self;
        for segment in path.split('.') {
            node = match node {
                Self::Mapping(fields) => fields.get(segment).ok_or_else(|| {
                    SecretError::decryption(format!(
                        "no field '{}' while resolving key path '{}'",
                        segment, path
                    ))
                })?,
                Self::Sequence(items) => {
                    let index = parse_index(segment).ok_or_else(|| {
                        SecretError::decryption(format!(
                            "'{}' is not a sequence index while resolving key path '{}'",
                            segment, path
                        ))
                    })?;
                    items.get(index).ok_or_else(|| {
                        SecretError::decryption(format!(
                            "index {} is out of range ({} items) while resolving key path '{}'",
                            index,
                            items.len(),
                            path
                        ))
                    })?
                }
                Self::Scalar(_) | Self::Null => {
                    return Err(SecretError::decryption(format!(
                        "cannot select '{}' from a {} while resolving key path '{}'",
                        segment,
                        node.kind(),
                        path
                    )));
                }
            };
        }

        match node {
            Self::Scalar(value) => Ok(value),
            other => Err(SecretError::decryption(format!(
                "key path '{}' selects a {}, expected a scalar",
                path,
                other.kind()
            ))),
        }
    }

    /// Converts a mapping of scalars into named secret values.
    pub fn into_string_map(self) -> Result<IndexMap<String, SecretString>> {
        let fields = match self {
            Self::Mapping(fields) => fields,
            other => {
                return Err(SecretError::decryption(format!(
                    "expected a mapping of strings, found a {}",
                    other.kind()
                )));
            }
        };

        let mut values = IndexMap::with_capacity(fields.len());
        for (name, node) in fields {
            match node {
                Self::Scalar(value) => {
                    values.insert(name, SecretString::new(value));
                }
                other => {
                    return Err(SecretError::decryption(format!(
                        "field '{}' is a {}, expected a scalar",
                        name,
                        other.kind()
                    )));
                }
            }
        }
        Ok(values)
    }

    /// Converts a top-level scalar into a secret value.
    pub fn into_scalar(self) -> Result<SecretString> {
        match self {
            Self::Scalar(value) => Ok(SecretString::new(value)),
            other => Err(SecretError::decryption(format!(
                "expected a string, found a {}",
                other.kind()
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Null => "null",
        }
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn yaml_key_text(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some("null".to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key_text(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
    }
}

impl From<serde_yaml::Value> for DocumentNode {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Scalar(b.to_string()),
            serde_yaml::Value::Number(n) => Self::Scalar(n.to_string()),
            serde_yaml::Value::String(s) => Self::Scalar(s),
            serde_yaml::Value::Sequence(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_yaml::Value::Mapping(mapping) => Self::Mapping(
                mapping
                    .into_iter()
                    .filter_map(|(key, value)| yaml_key_text(key).map(|k| (k, Self::from(value))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

impl From<serde_json::Value> for DocumentNode {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Scalar(b.to_string()),
            serde_json::Value::Number(n) => Self::Scalar(n.to_string()),
            serde_json::Value::String(s) => Self::Scalar(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(fields) => {
                Self::Mapping(fields.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

fn cbor_scalar_text(value: ciborium::Value) -> Option<String> {
    match value {
        ciborium::Value::Text(s) => Some(s),
        ciborium::Value::Integer(i) => Some(i128::from(i).to_string()),
        ciborium::Value::Float(f) => Some(f.to_string()),
        ciborium::Value::Bool(b) => Some(b.to_string()),
        ciborium::Value::Bytes(bytes) => String::from_utf8(bytes).ok(),
        ciborium::Value::Tag(_, inner) => cbor_scalar_text(*inner),
        _ => None,
    }
}

impl From<ciborium::Value> for DocumentNode {
    fn from(value: ciborium::Value) -> Self {
        match value {
            ciborium::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            ciborium::Value::Map(entries) => Self::Mapping(
                entries
                    .into_iter()
                    .filter_map(|(key, value)| {
                        cbor_scalar_text(key).map(|k| (k, Self::from(value)))
                    })
                    .collect(),
            ),
            ciborium::Value::Tag(_, inner) => Self::from(*inner),
            other => cbor_scalar_text(other).map_or(Self::Null, Self::Scalar),
        }
    }
}
