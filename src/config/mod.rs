//! # Configuration Management
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. a configuration file, when one is given (format chosen by extension)
//! 3. environment variables prefixed with `SECRETS__`, sections separated by
//!    `__`, e.g. `SECRETS__CACHE__MAXIMUM_SIZE=500`
//!
//! The result is validated before it is returned.

pub mod settings;

pub use settings::{CacheConfig, LoggingConfig, SecretsConfig};

use std::path::Path;

use crate::secrets::error::Result;

/// Prefix of environment variables read by [`SecretsConfig::from_env`].
pub const ENV_PREFIX: &str = "SECRETS";
const ENV_SEPARATOR: &str = "__";

impl SecretsConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// A file that is named but missing is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }
}
