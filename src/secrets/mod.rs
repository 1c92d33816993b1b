//! Secret reference resolution.
//!
//! Configuration values may point at secrets instead of carrying them. This
//! module parses those pointers, dispatches them to the engine that can
//! resolve them, and caches what it fetches.
//!
//! # Reference formats
//!
//! - **Encrypted secrets** (operator managed):
//!   `encrypted:<engine>!<key>:<value>!...`, e.g.
//!   `encrypted:s3!b:my-bucket!r:us-east-1!f:secrets.yml!k:db.password`
//! - **User secrets** (end-user managed):
//!   `secret://<engine>?<key>=<value>&...`, e.g. `secret://noop?v=hunter2&k=v`
//!
//! # Architecture
//!
//! - [`SecretEngineRegistry`] maps identifiers to [`SecretEngine`] trait objects
//! - [`StorageSecretEngine`] downloads whole files through a
//!   [`RemoteFileDownloader`] and extracts a key path from YAML or JSON
//! - [`SecretCache`] bounds memory with LRU plus two TTLs and guarantees a
//!   single in-flight computation per key
//! - [`UserSecretService`] resolves user secrets and tracks which resources use them
//!
//! # Example
//!
//! ```rust,ignore
//! use secret_engine::secrets::{
//!     parse_encrypted_secret, CacheSettings, FileSystemDownloader, SecretEngine,
//!     SecretEngineRegistry, StorageSecretEngine,
//! };
//! use std::sync::Arc;
//!
//! let engine = StorageSecretEngine::with_settings(
//!     "file",
//!     Arc::new(FileSystemDownloader::new("/etc/secrets")),
//!     CacheSettings::default(),
//! );
//! let engine: Arc<dyn SecretEngine> = Arc::new(engine);
//! let registry = SecretEngineRegistry::with_engines([engine])?;
//!
//! let secret = parse_encrypted_secret("encrypted:file!b:prod!r:local!f:db.yml!k:password")
//!     .expect("reference");
//! let password = registry.decrypt(&secret).await?.into_secret_string()?;
//! ```
//!
//! # Security
//!
//! Decrypted values are returned in [`SecretBytes`] and [`SecretString`],
//! which redact themselves in `Debug` output and zero their memory on drop.
//! Log events and error messages carry engine identifiers and file locations,
//! never values.

pub mod cache;
pub mod engine;
pub mod engines;
pub mod error;
pub mod reference;
pub mod registry;
pub mod types;
pub mod user;
pub mod validator;

pub use cache::{CacheSettings, SecretCache};
pub use engine::{SecretEngine, SecretEngineKind};
pub use engines::{
    CacheKey, DocumentNode, FileSystemDownloader, NoopSecretEngine, RemoteFileDownloader,
    StorageSecretEngine,
};
pub use error::{Result, SecretError};
pub use reference::{parse_encrypted_secret, EncryptedSecret, ENCRYPTED_STRING_PREFIX};
pub use registry::SecretEngineRegistry;
pub use types::{SecretBytes, SecretString};
pub use user::{
    UserSecret, UserSecretData, UserSecretManager, UserSecretMapper, UserSecretMetadata,
    UserSecretReference, UserSecretService,
};
pub use validator::SecretReferenceValidator;
