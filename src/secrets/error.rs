//! Error types for secret reference resolution.
//!
//! Messages carry enough context (engine, bucket, region, file, requested
//! path) to diagnose a failure. They never carry decrypted secret material,
//! and parser errors from document decoders are reduced to their location so
//! that a decoder echoing input cannot leak a value.

use thiserror::Error;

/// Result type for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;

/// Errors that can occur while parsing, validating or resolving secrets.
///
/// The type is `Clone` so that a single failed remote fetch can be delivered
/// to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// Malformed reference text or missing engine parameters.
    #[error("Invalid secret format: {message}")]
    InvalidFormat { message: String },

    /// No engine registered under the requested identifier.
    #[error("Unknown secret engine identifier: {engine}")]
    NoSuchEngine { engine: String },

    /// The secret was fetched but could not be decoded or extracted.
    #[error("Secret decryption failed: {message}")]
    Decryption { message: String },

    /// The remote store could not be read.
    #[error(
        "Failed to fetch secret file (bucket: {bucket}, region: {region}, file: {file}): {message}"
    )]
    Fetch { bucket: String, region: String, file: String, message: String },

    /// The decrypted user secret has no field with the requested name.
    #[error("User secret {reference} has no field named '{field}'")]
    NoSuchField { reference: String, field: String },

    /// Two engines were registered under the same identifier.
    #[error("Secret engine '{engine}' is already registered")]
    DuplicateEngine { engine: String },

    /// The engine does not implement the requested operation.
    #[error("Secret engine '{engine}' does not support {operation}")]
    UnsupportedOperation { engine: String, operation: String },

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SecretError {
    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat { message: message.into() }
    }

    /// Create an unknown engine error.
    pub fn no_such_engine(engine: impl Into<String>) -> Self {
        Self::NoSuchEngine { engine: engine.into() }
    }

    /// Create a decryption error.
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption { message: message.into() }
    }

    /// Create a fetch error for a remote file.
    pub fn fetch(
        bucket: impl Into<String>,
        region: impl Into<String>,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Fetch {
            bucket: bucket.into(),
            region: region.into(),
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a missing field error.
    pub fn no_such_field(reference: impl Into<String>, field: impl Into<String>) -> Self {
        Self::NoSuchField { reference: reference.into(), field: field.into() }
    }

    /// Create a duplicate engine error.
    pub fn duplicate_engine(engine: impl Into<String>) -> Self {
        Self::DuplicateEngine { engine: engine.into() }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(engine: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation { engine: engine.into(), operation: operation.into() }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Stable machine-readable code for this error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "secrets.invalid_format",
            Self::NoSuchEngine { .. } => "secrets.no_such_engine",
            Self::Decryption { .. } => "secrets.decryption_failed",
            Self::Fetch { .. } => "secrets.fetch_failed",
            Self::NoSuchField { .. } => "secrets.no_such_field",
            Self::DuplicateEngine { .. } => "secrets.duplicate_engine",
            Self::UnsupportedOperation { .. } => "secrets.unsupported_operation",
            Self::Config { .. } => "secrets.config",
        }
    }

    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// Only remote fetch failures are transient; everything else is a
    /// configuration or data problem that a retry cannot fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

impl From<serde_yaml::Error> for SecretError {
    fn from(error: serde_yaml::Error) -> Self {
        match error.location() {
            Some(location) => Self::decryption(format!(
                "secret document is not valid YAML (line {}, column {})",
                location.line(),
                location.column()
            )),
            None => Self::decryption("secret document is not valid YAML"),
        }
    }
}

impl From<serde_json::Error> for SecretError {
    fn from(error: serde_json::Error) -> Self {
        Self::decryption(format!(
            "secret payload is not valid JSON ({:?} error at line {}, column {})",
            error.classify(),
            error.line(),
            error.column()
        ))
    }
}

impl<E: std::fmt::Debug> From<ciborium::de::Error<E>> for SecretError {
    fn from(error: ciborium::de::Error<E>) -> Self {
        match error {
            ciborium::de::Error::Syntax(offset) => Self::decryption(format!(
                "secret payload is not valid CBOR (syntax error at byte {})",
                offset
            )),
            ciborium::de::Error::Semantic(Some(offset), _) => Self::decryption(format!(
                "secret payload is not valid CBOR (unexpected item at byte {})",
                offset
            )),
            _ => Self::decryption("secret payload is not valid CBOR"),
        }
    }
}

impl From<config::ConfigError> for SecretError {
    fn from(error: config::ConfigError) -> Self {
        Self::config(format!("Configuration loading failed: {}", error))
    }
}

impl From<validator::ValidationErrors> for SecretError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_validation_messages("", &errors, &mut messages);
        Self::config(format!("Validation failed: {}", messages.join("; ")))
    }
}

/// Flattens nested validation errors into `section.field: message` lines.
fn collect_validation_messages(
    prefix: &str,
    errors: &validator::ValidationErrors,
    messages: &mut Vec<String>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let details: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                messages.push(format!("{}: {}", path, details.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_messages(&path, nested, messages);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_messages(&format!("{}[{}]", path, index), nested, messages);
                }
            }
        }
    }
}
