//! Local filesystem downloader
//!
//! Serves `<root>/<bucket>/<file>` for storage engines during development and
//! tests. The region is ignored.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::secrets::engines::storage::{CacheKey, RemoteFileDownloader};
use crate::secrets::error::Result;

/// Reads secret files from a directory tree.
#[derive(Debug, Clone)]
pub struct FileSystemDownloader {
    root: PathBuf,
}

impl FileSystemDownloader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key to a path below the root, refusing anything that could
    /// escape it.
    fn resolve(&self, key: &CacheKey) -> Result<PathBuf> {
        let bucket = Path::new(&key.bucket);
        let file = Path::new(&key.file);
        if !is_contained(bucket) || bucket.components().count() != 1 {
            return Err(key.fetch_error("bucket must be a single directory name"));
        }
        if !is_contained(file) {
            return Err(key.fetch_error("file must be a relative path without '..'"));
        }
        Ok(self.root.join(bucket).join(file))
    }
}

fn is_contained(path: &Path) -> bool {
    path.components().next().is_some()
        && path.components().all(|component| matches!(component, Component::Normal(_)))
}

#[async_trait]
impl RemoteFileDownloader for FileSystemDownloader {
    async fn download_remote_file(&self, key: &CacheKey) -> Result<Bytes> {
        let path = self.resolve(key)?;
        debug!(path = %path.display(), "Reading secret file");
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|e| key.fetch_error(format!("failed to read {}: {}", path.display(), e)))?;
        Ok(Bytes::from(contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::error::SecretError;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileSystemDownloader) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("bucket/nested")).unwrap();
        std::fs::write(dir.path().join("bucket/secrets.yml"), "password: hunter2\n").unwrap();
        std::fs::write(dir.path().join("bucket/nested/key.pem"), "PEM").unwrap();
        let downloader = FileSystemDownloader::new(dir.path());
        (dir, downloader)
    }

    #[tokio::test]
    async fn test_reads_files_below_root() {
        let (_dir, downloader) = setup();

        let contents = downloader
            .download_remote_file(&CacheKey::new("bucket", "ignored", "secrets.yml"))
            .await
            .unwrap();
        assert_eq!(&contents[..], b"password: hunter2\n");

        let nested = downloader
            .download_remote_file(&CacheKey::new("bucket", "", "nested/key.pem"))
            .await
            .unwrap();
        assert_eq!(&nested[..], b"PEM");
    }

    #[tokio::test]
    async fn test_missing_file_is_a_fetch_error() {
        let (_dir, downloader) = setup();
        let err = downloader
            .download_remote_file(&CacheKey::new("bucket", "us-east-1", "absent.yml"))
            .await
            .unwrap_err();

        assert!(matches!(err, SecretError::Fetch { .. }));
        assert!(err.to_string().contains("absent.yml"));
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_root() {
        let (_dir, downloader) = setup();

        for (bucket, file) in [
            ("bucket", "../bucket/secrets.yml"),
            ("bucket", "/etc/passwd"),
            ("..", "secrets.yml"),
            ("bucket/nested", "key.pem"),
            ("bucket", ""),
        ] {
            let result = downloader.download_remote_file(&CacheKey::new(bucket, "r", file)).await;
            assert!(
                matches!(result, Err(SecretError::Fetch { .. })),
                "expected {}/{} to be rejected",
                bucket,
                file
            );
        }
    }
}
