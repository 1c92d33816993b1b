//! # Configuration Settings
//!
//! Defines the configuration structure for secret resolution.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use validator::Validate;

use crate::secrets::cache::{
    CacheSettings, DEFAULT_EXPIRE_AFTER_ACCESS, DEFAULT_EXPIRE_AFTER_WRITE, DEFAULT_MAXIMUM_SIZE,
    DEFAULT_USER_SECRET_EXPIRE_AFTER_ACCESS, DEFAULT_USER_SECRET_EXPIRE_AFTER_WRITE,
    DEFAULT_USER_SECRET_MAXIMUM_SIZE,
};
use crate::secrets::error::{Result, SecretError};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct SecretsConfig {
    /// Cache for files fetched by storage engines
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Cache for decrypted user secrets
    #[validate(nested)]
    pub user_secrets: CacheConfig,

    #[validate(nested)]
    pub logging: LoggingConfig,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            user_secrets: CacheConfig::user_secrets(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SecretsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(SecretError::from)?;
        self.cache.validate_custom("cache");
        self.user_secrets.validate_custom("user_secrets");
        Ok(())
    }
}

/// Cache limits, with expiry given in seconds
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached entries
    #[validate(range(min = 1, message = "Maximum size must be at least 1"))]
    pub maximum_size: usize,

    /// Seconds an entry lives after being written, regardless of reads
    #[validate(range(min = 1, message = "Expire after write must be at least 1 second"))]
    pub expire_after_write_seconds: u64,

    /// Seconds an entry lives after its last read or write
    #[validate(range(min = 1, message = "Expire after access must be at least 1 second"))]
    pub expire_after_access_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maximum_size: DEFAULT_MAXIMUM_SIZE,
            expire_after_write_seconds: DEFAULT_EXPIRE_AFTER_WRITE.as_secs(),
            expire_after_access_seconds: DEFAULT_EXPIRE_AFTER_ACCESS.as_secs(),
        }
    }
}

impl CacheConfig {
    /// Defaults for the user secret cache
    pub fn user_secrets() -> Self {
        Self {
            maximum_size: DEFAULT_USER_SECRET_MAXIMUM_SIZE,
            expire_after_write_seconds: DEFAULT_USER_SECRET_EXPIRE_AFTER_WRITE.as_secs(),
            expire_after_access_seconds: DEFAULT_USER_SECRET_EXPIRE_AFTER_ACCESS.as_secs(),
        }
    }

    pub fn expire_after_write(&self) -> Duration {
        Duration::from_secs(self.expire_after_write_seconds)
    }

    pub fn expire_after_access(&self) -> Duration {
        Duration::from_secs(self.expire_after_access_seconds)
    }

    /// Convert to the limits the cache itself uses
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            maximum_size: self.maximum_size,
            expire_after_write: self.expire_after_write(),
            expire_after_access: self.expire_after_access(),
        }
    }

    /// An access window longer than the write window never takes effect,
    /// since the write window expires the entry first.
    fn validate_custom(&self, section: &str) {
        if self.expire_after_access_seconds > self.expire_after_write_seconds {
            warn!(
                section = section,
                expire_after_access_seconds = self.expire_after_access_seconds,
                expire_after_write_seconds = self.expire_after_write_seconds,
                "Expire after access exceeds expire after write and will never apply"
            );
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    /// Enable JSON structured logging
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
