//! # Structured Logging
//!
//! Sets up the global `tracing` subscriber and provides span macros for
//! secret operations.
//!
//! Events emitted by this crate carry engine identifiers, bucket/region/file
//! locations and error codes. They never carry secret values or the full text
//! of a reference, since a reference may embed its value (see the `noop` engine).

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::secrets::error::{Result, SecretError};

/// Create a tracing span for a secret operation.
///
/// ```rust,ignore
/// let span = secret_span!("decrypt_user_secret", engine.identifier());
/// ```
#[macro_export]
macro_rules! secret_span {
    ($operation:expr, $engine:expr) => {
        tracing::debug_span!(
            "secret_operation",
            operation = %$operation,
            engine = %$engine,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $engine:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "secret_operation",
            operation = %$operation,
            engine = %$engine,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Build the event filter: `RUST_LOG` when set, the configured level otherwise.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| SecretError::config(format!("Invalid log filter: {}", e)))
}

/// Install the global subscriber.
///
/// A subscriber installed earlier (for example by a test harness) is left in
/// place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;

    let installed = if config.json {
        fmt().json().with_env_filter(filter).with_current_span(true).try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already set, keeping it");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_from_config() {
        let config = LoggingConfig { level: "secret_engine=debug".to_string(), json: false };
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let config = LoggingConfig { level: "secret_engine=verbose".to_string(), json: false };
        if std::env::var(EnvFilter::DEFAULT_ENV).is_err() {
            assert!(matches!(env_filter(&config), Err(SecretError::Config { .. })));
        }
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_secret_span_macro() {
        let span = crate::secret_span!("decrypt", "noop");
        let _entered = span.enter();
        let span = crate::secret_span!("decrypt", "s3", bucket = "my-bucket");
        drop(span);
    }
}
