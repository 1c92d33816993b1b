//! Common test utilities for all integration tests.
//!
//! Provides an in-memory object store with download counting and helpers for
//! building registries and services around it.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use async_trait::async_trait;
use bytes::Bytes;
use secret_engine::secrets::{
    CacheKey, CacheSettings, NoopSecretEngine, RemoteFileDownloader, Result, SecretEngine,
    SecretEngineRegistry, StorageSecretEngine, UserSecretManager, UserSecretService,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

pub const BUCKET: &str = "my-bucket";
pub const REGION: &str = "us-east-1";
pub const FILE: &str = "secrets.yml";

pub const SECRETS_YAML: &str = "\
db:
  password: correct-horse-battery-staple
  user: app
api:
  tokens:
    - first-token
    - second-token
";

/// Object store held in memory.
///
/// Counts downloads per key, can hold every download for a fixed delay and
/// can require downloads to rendezvous on a barrier.
#[derive(Debug, Default)]
pub struct MockObjectStore {
    files: Mutex<HashMap<CacheKey, Bytes>>,
    downloads: Mutex<HashMap<CacheKey, usize>>,
    total: AtomicUsize,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn with_file(self, bucket: &str, region: &str, file: &str, contents: &str) -> Self {
        self.put(bucket, region, file, contents);
        self
    }

    pub fn put(&self, bucket: &str, region: &str, file: &str, contents: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(CacheKey::new(bucket, region, file), Bytes::from(contents.to_string()));
    }

    pub fn remove(&self, bucket: &str, region: &str, file: &str) {
        self.files.lock().unwrap().remove(&CacheKey::new(bucket, region, file));
    }

    pub fn total_downloads(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn downloads_of(&self, bucket: &str, region: &str, file: &str) -> usize {
        self.downloads
            .lock()
            .unwrap()
            .get(&CacheKey::new(bucket, region, file))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl RemoteFileDownloader for MockObjectStore {
    async fn download_remote_file(&self, key: &CacheKey) -> Result<Bytes> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.downloads.lock().unwrap().entry(key.clone()).or_insert(0) += 1;

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let contents = self.files.lock().unwrap().get(key).cloned();
        contents.ok_or_else(|| key.fetch_error("The specified key does not exist"))
    }
}

/// Store preloaded with [`SECRETS_YAML`] at `my-bucket/secrets.yml`.
pub fn default_store() -> MockObjectStore {
    MockObjectStore::new().with_file(BUCKET, REGION, FILE, SECRETS_YAML)
}

/// Registry with an `s3` storage engine over `store` and the `noop` engine.
pub fn registry_with_store(
    store: Arc<MockObjectStore>,
    settings: CacheSettings,
) -> SecretEngineRegistry {
    let storage = StorageSecretEngine::with_settings("s3", store, settings);
    let engines: [Arc<dyn SecretEngine>; 2] =
        [Arc::new(storage), Arc::new(NoopSecretEngine::new())];
    SecretEngineRegistry::with_engines(engines).unwrap()
}

/// User secret service over a registry containing only the `noop` engine.
pub fn noop_service() -> Arc<UserSecretService> {
    let registry = SecretEngineRegistry::with_engines([
        Arc::new(NoopSecretEngine::new()) as Arc<dyn SecretEngine>
    ])
    .unwrap();
    Arc::new(UserSecretService::new(UserSecretManager::with_default_cache(Arc::new(registry))))
}

/// Reference into the default file at `key`.
pub fn s3_reference(key: &str) -> String {
    format!("encrypted:s3!b:{}!r:{}!f:{}!k:{}", BUCKET, REGION, FILE, key)
}
