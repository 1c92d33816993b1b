//! Storage-backed secret engine
//!
//! Resolves references of the form
//! `encrypted:<engine>!b:<bucket>!r:<region>!f:<file>[!k:<key.path>]` by
//! downloading the whole file from an object store and, when a key path is
//! given, extracting one scalar from it.
//!
//! Downloads are cached per `(bucket, region, file)` and single-flight: many
//! concurrent references into the same file cause one download.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::secrets::cache::{CacheSettings, SecretCache};
use crate::secrets::engine::{SecretEngine, SecretEngineKind};
use crate::secrets::engines::document::DocumentNode;
use crate::secrets::error::{Result, SecretError};
use crate::secrets::reference::{EncryptedSecret, KEY_PARAM};
use crate::secrets::types::SecretBytes;

/// Parameter naming the storage bucket.
pub const BUCKET_PARAM: &str = "b";
/// Parameter naming the storage region.
pub const REGION_PARAM: &str = "r";
/// Parameter naming the file within the bucket.
pub const FILE_PARAM: &str = "f";

/// Identifies one remote file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub bucket: String,
    pub region: String,
    pub file: String,
}

impl CacheKey {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self { bucket: bucket.into(), region: region.into(), file: file.into() }
    }

    /// Builds the key from a validated reference's `b`, `r` and `f` parameters.
    fn from_secret(secret: &EncryptedSecret) -> Result<Self> {
        let param = |name: &str| {
            secret.param(name).ok_or_else(|| missing_parameter(name)).map(str::to_string)
        };
        Ok(Self {
            bucket: param(BUCKET_PARAM)?,
            region: param(REGION_PARAM)?,
            file: param(FILE_PARAM)?,
        })
    }

    /// Builds a fetch error carrying this file's location.
    pub fn fetch_error(&self, message: impl Into<String>) -> SecretError {
        SecretError::fetch(&self.bucket, &self.region, &self.file, message)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.bucket, self.file, self.region)
    }
}

/// Downloads whole files from a remote object store.
///
/// Implementations should report failures with [`CacheKey::fetch_error`] so
/// the bucket, region and file reach the caller.
#[async_trait]
pub trait RemoteFileDownloader: Send + Sync + fmt::Debug {
    async fn download_remote_file(&self, key: &CacheKey) -> Result<Bytes>;
}

/// Secret engine backed by files in an object store.
#[derive(Clone)]
pub struct StorageSecretEngine {
    identifier: String,
    downloader: Arc<dyn RemoteFileDownloader>,
    cache: SecretCache<CacheKey, Bytes>,
}

impl fmt::Debug for StorageSecretEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSecretEngine")
            .field("identifier", &self.identifier)
            .field("downloader", &self.downloader)
            .field("cache", &self.cache)
            .finish()
    }
}

impl StorageSecretEngine {
    /// Create an engine with the given downloader and cache
    pub fn new(
        identifier: impl Into<String>,
        downloader: Arc<dyn RemoteFileDownloader>,
        cache: SecretCache<CacheKey, Bytes>,
    ) -> Self {
        Self { identifier: identifier.into(), downloader, cache }
    }

    /// Create an engine whose cache uses the given limits
    pub fn with_settings(
        identifier: impl Into<String>,
        downloader: Arc<dyn RemoteFileDownloader>,
        settings: CacheSettings,
    ) -> Self {
        Self::new(identifier, downloader, SecretCache::new(settings))
    }

    pub fn cache(&self) -> &SecretCache<CacheKey, Bytes> {
        &self.cache
    }

    /// Fetch the raw file contents, downloading at most once per key at a time.
    async fn fetch(&self, key: CacheKey) -> Result<Bytes> {
        let downloader = Arc::clone(&self.downloader);
        let download_key = key.clone();
        self.cache
            .get_or_compute(key, move || async move {
                debug!(
                    bucket = %download_key.bucket,
                    region = %download_key.region,
                    file = %download_key.file,
                    "Downloading secret file"
                );
                match downloader.download_remote_file(&download_key).await {
                    Ok(contents) => Ok(contents),
                    Err(e) => {
                        warn!(
                            bucket = %download_key.bucket,
                            region = %download_key.region,
                            file = %download_key.file,
                            error_code = e.error_code(),
                            "Failed to download secret file"
                        );
                        Err(e)
                    }
                }
            })
            .await
    }
}

fn missing_parameter(name: &str) -> SecretError {
    let description = match name {
        BUCKET_PARAM => "Storage bucket",
        REGION_PARAM => "Storage region",
        _ => "Storage file",
    };
    SecretError::invalid_format(format!("{} parameter is missing ({}:...)", description, name))
}

#[async_trait]
impl SecretEngine for StorageSecretEngine {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn kind(&self) -> SecretEngineKind {
        SecretEngineKind::Storage
    }

    fn validate(&self, secret: &EncryptedSecret) -> Result<()> {
        for name in [BUCKET_PARAM, REGION_PARAM, FILE_PARAM] {
            if !secret.has_param(name) {
                return Err(missing_parameter(name));
            }
        }
        Ok(())
    }

    async fn decrypt(&self, secret: &EncryptedSecret) -> Result<SecretBytes> {
        let key = CacheKey::from_secret(secret)?;
        let contents = self.fetch(key).await?;

        match secret.param(KEY_PARAM) {
            None => Ok(SecretBytes::new(contents.to_vec())),
            Some(path) => {
                let document = DocumentNode::from_yaml_slice(&contents)?;
                let value = document.extract(path)?;
                Ok(SecretBytes::new(value.as_bytes()))
            }
        }
    }

    async fn clear_cache(&self) {
        self.cache.clear().await;
        info!(engine = %self.identifier, "Cleared storage secret cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    #[derive(Debug, Default)]
    struct InMemoryDownloader {
        files: HashMap<CacheKey, Bytes>,
        downloads: AtomicUsize,
    }

    impl InMemoryDownloader {
        fn with_file(mut self, key: CacheKey, contents: &'static str) -> Self {
            self.files.insert(key, Bytes::from_static(contents.as_bytes()));
            self
        }
    }

    #[async_trait]
    impl RemoteFileDownloader for InMemoryDownloader {
        async fn download_remote_file(&self, key: &CacheKey) -> Result<Bytes> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            self.files.get(key).cloned().ok_or_else(|| key.fetch_error("no such object"))
        }
    }

    const DOCUMENT: &str = "test: value\na:\n  b: othervalue\nc:\n  - d\n  - e\n";

    fn engine() -> (StorageSecretEngine, Arc<InMemoryDownloader>) {
        let downloader = Arc::new(
            InMemoryDownloader::default()
                .with_file(CacheKey::new("bucket", "us-east-1", "secrets.yml"), DOCUMENT),
        );
        let engine = StorageSecretEngine::with_settings(
            "s3",
            Arc::clone(&downloader) as Arc<dyn RemoteFileDownloader>,
            CacheSettings::default(),
        );
        (engine, downloader)
    }

    fn secret(key: Option<&str>) -> EncryptedSecret {
        let mut text = "encrypted:s3!b:bucket!r:us-east-1!f:secrets.yml".to_string();
        if let Some(key) = key {
            text.push_str("!k:");
            text.push_str(key);
        }
        EncryptedSecret::parse(&text).unwrap()
    }

    #[test]
    fn test_validate_requires_location() {
        let (engine, _) = engine();
        assert!(engine.validate(&secret(None)).is_ok());

        for text in [
            "encrypted:s3!r:us-east-1!f:secrets.yml",
            "encrypted:s3!b:bucket!f:secrets.yml",
            "encrypted:s3!b:bucket!r:us-east-1",
        ] {
            let secret = EncryptedSecret::parse(text).unwrap();
            assert!(matches!(engine.validate(&secret), Err(SecretError::InvalidFormat { .. })));
        }
    }

    #[tokio::test]
    async fn test_decrypt_whole_file() {
        let (engine, _) = engine();
        let value = engine.decrypt(&secret(None)).await.unwrap();
        assert_eq!(value.expose_secret(), DOCUMENT.as_bytes());
    }

    #[tokio::test]
    async fn test_decrypt_key_paths() {
        let (engine, downloader) = engine();

        let expectations = [("test", "value"), ("a.b", "othervalue"), ("c.0", "d"), ("c.1", "e")];
        for (path, expected) in expectations {
            let value = engine.decrypt(&secret(Some(path))).await.unwrap();
            assert_eq!(value.expose_secret(), expected.as_bytes());
        }
        for path in ["a", "c.2", "missing"] {
            assert!(matches!(
                engine.decrypt(&secret(Some(path))).await,
                Err(SecretError::Decryption { .. })
            ));
        }

        // Every lookup above reads the same cached file.
        assert_eq!(downloader.downloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_and_not_cached() {
        let (engine, downloader) = engine();
        let missing =
            EncryptedSecret::parse("encrypted:s3!b:bucket!r:us-east-1!f:other.yml").unwrap();

        for _ in 0..2 {
            let err = engine.decrypt(&missing).await.unwrap_err();
            assert!(err.is_retryable());
            assert!(err.to_string().contains("other.yml"));
        }
        assert_eq!(downloader.downloads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_download() {
        let (engine, downloader) = engine();

        engine.decrypt(&secret(Some("test"))).await.unwrap();
        engine.clear_cache().await;
        engine.decrypt(&secret(Some("test"))).await.unwrap();

        assert_eq!(downloader.downloads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_logs_carry_location_but_not_values() {
        let (engine, _) = engine();
        engine.decrypt(&secret(Some("a.b"))).await.unwrap();

        assert!(logs_contain("Downloading secret file"));
        assert!(logs_contain("secrets.yml"));
        assert!(!logs_contain("othervalue"));
    }

    #[test]
    fn test_cache_key_identity() {
        assert_eq!(CacheKey::new("b", "r", "f"), CacheKey::new("b", "r", "f"));
        assert_ne!(CacheKey::new("b", "r", "f"), CacheKey::new("b", "r2", "f"));
        assert_eq!(CacheKey::new("b", "r", "f").to_string(), "b/f (r)");
    }
}
