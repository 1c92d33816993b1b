//! User secret references.
//!
//! User secrets are referenced with a URI naming the engine and its
//! parameters:
//!
//! ```text
//! secret://<engine-identifier>?<param-name_1>=<param-value_1>&..&<param-name_n>=<param-value_n>
//! ```
//!
//! The optional `k` parameter names the field of the decrypted secret to use.
//! Values are taken verbatim; no percent-decoding is applied.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::secrets::error::{Result, SecretError};
use crate::secrets::reference::{is_param_name, KEY_PARAM};

/// Scheme prefix of every user secret reference.
pub const SECRET_URI_SCHEME: &str = "secret://";

lazy_static! {
    static ref USER_SECRET_URI_REGEX: Regex =
        Regex::new(r"^secret://([a-zA-Z0-9][-a-zA-Z0-9_.]*)\?(.+)$")
            .expect("USER_SECRET_URI_REGEX should be a valid regex pattern");
}

/// A parsed `secret://` reference.
///
/// Equality and hashing ignore parameter order, so the same secret written
/// two ways shares one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSecretReference {
    engine_identifier: String,
    parameters: IndexMap<String, String>,
}

impl UserSecretReference {
    /// Parses a user secret URI.
    pub fn parse(input: &str) -> Result<Self> {
        let captures = USER_SECRET_URI_REGEX.captures(input).ok_or_else(|| {
            SecretError::invalid_format(format!(
                "Invalid user secret URI, expected '{}<engine>?<key>=<value>'",
                SECRET_URI_SCHEME
            ))
        })?;
        let engine_identifier = &captures[1];
        let query = &captures[2];

        let mut parameters = IndexMap::new();
        for pair in query.split('&') {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                SecretError::invalid_format(
                    "Invalid user secret URI, parameters must be written as '<key>=<value>'",
                )
            })?;
            if !is_param_name(name) {
                return Err(SecretError::invalid_format(format!(
                    "Invalid user secret URI, illegal parameter name '{}'",
                    name
                )));
            }
            if value.is_empty() {
                return Err(SecretError::invalid_format(format!(
                    "Invalid user secret URI, parameter '{}' has no value",
                    name
                )));
            }
            if parameters.insert(name.to_string(), value.to_string()).is_some() {
                return Err(SecretError::invalid_format(format!(
                    "Invalid user secret URI, duplicate parameter '{}'",
                    name
                )));
            }
        }

        Ok(Self { engine_identifier: engine_identifier.to_string(), parameters })
    }

    /// Whether `input` is a well-formed user secret URI.
    pub fn is_user_secret(input: &str) -> bool {
        input.starts_with(SECRET_URI_SCHEME) && Self::parse(input).is_ok()
    }

    pub fn engine_identifier(&self) -> &str {
        &self.engine_identifier
    }

    pub fn parameters(&self) -> &IndexMap<String, String> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Field of the decrypted secret to extract, if one was named.
    pub fn secret_key(&self) -> Option<&str> {
        self.parameter(KEY_PARAM)
    }
}

impl Hash for UserSecretReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.engine_identifier.hash(state);
        let mut sorted: Vec<_> = self.parameters.iter().collect();
        sorted.sort();
        sorted.hash(state);
    }
}

impl fmt::Display for UserSecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SECRET_URI_SCHEME, self.engine_identifier)?;
        for (i, (name, value)) in self.parameters.iter().enumerate() {
            let separator = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", separator, name, value)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for UserSecretReference {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
