//! Secret engine implementations
//!
//! - [`StorageSecretEngine`]: whole-file object store secrets with key-path extraction
//! - [`NoopSecretEngine`]: values embedded in the reference
//! - [`FileSystemDownloader`]: local directory tree standing in for an object store

pub mod document;
pub mod filesystem;
pub mod noop;
pub mod storage;

pub use document::DocumentNode;
pub use filesystem::FileSystemDownloader;
pub use noop::{NoopSecretEngine, NOOP_ENGINE_IDENTIFIER};
pub use storage::{CacheKey, RemoteFileDownloader, StorageSecretEngine};
