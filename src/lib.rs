//! # Secret Engine
//!
//! Resolves secret references found in configuration values.
//!
//! A configuration value can name a secret instead of containing it:
//!
//! ```text
//! encrypted:s3!b:my-bucket!r:us-east-1!f:secrets.yml!k:db.password
//! secret://secrets-manager?r=us-west-2&s=db-credentials&k=password
//! ```
//!
//! ## Architecture
//!
//! ```text
//! reference text → parser → engine registry → engine.decrypt()
//!                                                  ↓
//!                                  single-flight cache → remote file download
//!                                                  ↓
//!                                   YAML/JSON key path → secret bytes
//! ```
//!
//! ## Core Components
//!
//! - **Parsing**: [`secrets::EncryptedSecret`] and [`secrets::UserSecretReference`]
//! - **Dispatch**: [`secrets::SecretEngineRegistry`] of [`secrets::SecretEngine`] trait objects
//! - **Storage engines**: [`secrets::StorageSecretEngine`] over a pluggable downloader
//! - **Caching**: [`secrets::SecretCache`], bounded, dual-TTL and single-flight
//! - **User secrets**: [`secrets::UserSecretService`] with per-resource tracking
//! - **CLI**: [`cli::run_cli`] resolves references against a local directory
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use secret_engine::secrets::{
//!     EncryptedSecret, FileSystemDownloader, NoopSecretEngine, SecretEngine,
//!     SecretEngineRegistry, StorageSecretEngine,
//! };
//! use secret_engine::{Result, SecretsConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SecretsConfig::from_env()?;
//!     let storage = StorageSecretEngine::with_settings(
//!         "file",
//!         Arc::new(FileSystemDownloader::new("/etc/secrets")),
//!         config.cache.settings(),
//!     );
//!     let engines: [Arc<dyn SecretEngine>; 2] =
//!         [Arc::new(storage), Arc::new(NoopSecretEngine::new())];
//!     let registry = SecretEngineRegistry::with_engines(engines)?;
//!
//!     let secret = EncryptedSecret::parse("encrypted:file!b:prod!r:local!f:db.yml!k:password")?;
//!     let password = registry.decrypt(&secret).await?.into_secret_string()?;
//!     println!("{} characters", password.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::SecretsConfig;
pub use observability::init_logging;
pub use secrets::{Result, SecretError};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
