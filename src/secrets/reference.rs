//! Encrypted secret references.
//!
//! An encrypted secret names the engine that can resolve it and carries
//! named parameters for that engine:
//!
//! ```text
//! encrypted:<engine-identifier>!<param-name_1>:<param-value_1>!..!<param-name_n>:<param-value_n>
//! ```
//!
//! - parameter names match `[a-zA-Z0-9]+` and `encrypted` is reserved
//! - parameter values may contain `:` (only the first `:` delimits)
//! - at least one parameter is required

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::error::{Result, SecretError};

/// Prefix of every encrypted secret reference.
pub const ENCRYPTED_STRING_PREFIX: &str = "encrypted:";

/// Parameter naming the field to extract from a decrypted document.
pub const KEY_PARAM: &str = "k";

const PARAM_SEPARATOR: char = '!';
const KEY_VALUE_SEPARATOR: char = ':';
const RESERVED_PARAM_NAME: &str = "encrypted";

lazy_static! {
    static ref PARAM_NAME_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9]+$").expect("PARAM_NAME_REGEX should be a valid regex pattern");
}

/// Returns true when `name` is alphanumeric and non-empty.
pub(crate) fn is_param_name(name: &str) -> bool {
    PARAM_NAME_REGEX.is_match(name)
}

/// Returns true when `name` is usable as an encrypted secret parameter name.
pub(crate) fn is_valid_param_name(name: &str) -> bool {
    is_param_name(name) && name != RESERVED_PARAM_NAME
}

/// A parsed `encrypted:` reference.
///
/// Only [`EncryptedSecret::parse`] constructs values of this type, so every
/// instance satisfies the grammar. Equality ignores parameter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecret {
    engine_identifier: String,
    params: IndexMap<String, String>,
}

impl EncryptedSecret {
    /// Parses an encrypted secret reference.
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input.strip_prefix(ENCRYPTED_STRING_PREFIX).ok_or_else(|| {
            SecretError::invalid_format(format!(
                "Invalid encrypted secret format, must start with '{}'",
                ENCRYPTED_STRING_PREFIX
            ))
        })?;

        let mut segments = rest.split(PARAM_SEPARATOR);
        let engine_identifier = segments.next().unwrap_or_default();
        if engine_identifier.is_empty() {
            return Err(SecretError::invalid_format(
                "Invalid encrypted secret format, engine identifier is empty",
            ));
        }

        let mut params = IndexMap::new();
        for segment in segments {
            let (name, value) = segment.split_once(KEY_VALUE_SEPARATOR).ok_or_else(|| {
                SecretError::invalid_format(
                    "Invalid encrypted secret format, keys and values must be delimited by ':'",
                )
            })?;
            if !is_valid_param_name(name) {
                return Err(SecretError::invalid_format(format!(
                    "Invalid encrypted secret format, illegal parameter name '{}'",
                    name
                )));
            }
            if value.is_empty() {
                return Err(SecretError::invalid_format(format!(
                    "Invalid encrypted secret format, parameter '{}' has no value",
                    name
                )));
            }
            if params.insert(name.to_string(), value.to_string()).is_some() {
                return Err(SecretError::invalid_format(format!(
                    "Invalid encrypted secret format, duplicate parameter '{}'",
                    name
                )));
            }
        }

        if params.is_empty() {
            return Err(SecretError::invalid_format(
                "Invalid encrypted secret format, must have at least one parameter",
            ));
        }

        Ok(Self { engine_identifier: engine_identifier.to_string(), params })
    }

    /// Whether `input` is a well-formed encrypted secret reference.
    pub fn is_encrypted_secret(input: &str) -> bool {
        input.starts_with(ENCRYPTED_STRING_PREFIX) && Self::parse(input).is_ok()
    }

    pub fn engine_identifier(&self) -> &str {
        &self.engine_identifier
    }

    /// Parameters in the order they were written.
    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Formats this reference back into its textual form.
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ENCRYPTED_STRING_PREFIX, self.engine_identifier)?;
        for (name, value) in &self.params {
            write!(f, "{}{}{}{}", PARAM_SEPARATOR, name, KEY_VALUE_SEPARATOR, value)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for EncryptedSecret {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parses `text` as an encrypted secret, returning `None` when it is not one.
pub fn parse_encrypted_secret(text: &str) -> Option<EncryptedSecret> {
    EncryptedSecret::parse(text).ok()
}
