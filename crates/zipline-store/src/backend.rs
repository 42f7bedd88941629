//! Storage backend implementation.

use std::path::Path;

use bytes::Bytes;
use futures::TryStreamExt;
use opendal::{Operator, services};

use crate::TRACING_TARGET;
use crate::config::{BackendType, StorageConfig};
use crate::error::{StorageError, StorageResult};

/// One object returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full object key relative to the backend root.
    pub key: String,
}

/// Unified storage backend that wraps OpenDAL operators.
#[derive(Clone)]
pub struct StorageBackend {
    operator: Operator,
    config: StorageConfig,
}

impl StorageBackend {
    /// Creates a new storage backend from configuration.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            backend = ?config.backend_type,
            root = %config.root,
            "Storage backend initialized"
        );

        Ok(Self { operator, config })
    }

    /// Returns the configuration for this backend.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Lists non-directory objects under a prefix, recursively.
    ///
    /// Directory placeholder entries are excluded; `limit` truncates the
    /// listing after that many objects.
    pub async fn list(&self, prefix: &str, limit: Option<usize>) -> StorageResult<Vec<ObjectEntry>> {
        tracing::debug!(
            target: TRACING_TARGET,
            prefix = %prefix,
            "Listing objects"
        );

        let entries: Vec<_> = self
            .operator
            .lister_with(prefix)
            .recursive(true)
            .await?
            .try_collect()
            .await?;

        let mut objects: Vec<ObjectEntry> = entries
            .into_iter()
            .filter(|entry| !entry.metadata().is_dir())
            .map(|entry| ObjectEntry {
                key: entry.path().to_string(),
            })
            .collect();

        if let Some(limit) = limit {
            objects.truncate(limit);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            prefix = %prefix,
            count = objects.len(),
            "Objects listed"
        );

        Ok(objects)
    }

    /// Checks whether any entry exists under a prefix.
    pub async fn exists_prefix(&self, prefix: &str) -> StorageResult<bool> {
        let mut lister = self.operator.lister_with(prefix).recursive(true).await?;
        Ok(lister.try_next().await?.is_some())
    }

    /// Reads an object into memory.
    pub async fn read(&self, key: &str) -> StorageResult<Bytes> {
        let data = self.operator.read(key).await?.to_bytes();

        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            size = data.len(),
            "Object read"
        );

        Ok(data)
    }

    /// Writes an object.
    pub async fn write(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        self.operator.write(key, data.to_vec()).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            size = data.len(),
            "Object written"
        );

        Ok(())
    }

    /// Creates a zero-byte directory marker establishing a prefix.
    ///
    /// The path must end with `/`.
    pub async fn create_dir(&self, path: &str) -> StorageResult<()> {
        if !path.ends_with('/') {
            return Err(StorageError::invalid_path(format!(
                "directory marker must end with '/': {path}"
            )));
        }

        self.operator.create_dir(path).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Directory marker created"
        );

        Ok(())
    }

    /// Checks if an object exists.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.operator.exists(key).await?)
    }

    /// Copies an object. The source is left untouched.
    pub async fn copy(&self, from: &str, to: &str) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            from = %from,
            to = %to,
            "Copying object"
        );

        self.operator.copy(from, to).await?;

        Ok(())
    }

    /// Deletes an object.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            "Deleting object"
        );

        self.operator.delete(key).await?;

        Ok(())
    }

    /// Downloads an object to a local file.
    pub async fn download_to_file(&self, key: &str, path: &Path) -> StorageResult<u64> {
        let data = self.read(key).await?;
        let size = data.len() as u64;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &data).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            key = %key,
            path = %path.display(),
            size = size,
            "Object downloaded to file"
        );

        Ok(size)
    }

    /// Uploads a local file as an object.
    pub async fn upload_file(&self, path: &Path, key: &str) -> StorageResult<u64> {
        let data = tokio::fs::read(path).await?;
        let size = data.len() as u64;

        self.operator.write(key, data).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %path.display(),
            key = %key,
            size = size,
            "File uploaded"
        );

        Ok(size)
    }

    /// Creates an OpenDAL operator based on configuration.
    #[allow(unreachable_patterns)]
    fn create_operator(config: &StorageConfig) -> StorageResult<Operator> {
        match config.backend_type {
            #[cfg(feature = "s3")]
            BackendType::S3 => {
                let mut builder = services::S3::default().bucket(&config.root);

                if let Some(ref region) = config.region {
                    builder = builder.region(region);
                }

                if let Some(ref endpoint) = config.endpoint {
                    builder = builder.endpoint(endpoint);
                }

                if let Some(ref access_key_id) = config.access_key_id {
                    builder = builder.access_key_id(access_key_id);
                }

                if let Some(ref secret_access_key) = config.secret_access_key {
                    builder = builder.secret_access_key(secret_access_key);
                }

                Operator::new(builder).map_err(|e| StorageError::init(e.to_string()))
            }

            #[cfg(feature = "fs")]
            BackendType::Fs => {
                let builder = services::Fs::default().root(&config.root);

                Operator::new(builder).map_err(|e| StorageError::init(e.to_string()))
            }

            #[cfg(any(feature = "memory", test))]
            BackendType::Memory => {
                let builder = services::Memory::default();

                Operator::new(builder).map_err(|e| StorageError::init(e.to_string()))
            }

            // This should never be reached if the config was created with
            // the same features enabled
            #[allow(unreachable_patterns)]
            _ => Err(StorageError::init(format!(
                "backend type {:?} is not supported with current features",
                config.backend_type
            ))),
        }
    }
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend")
            .field("backend_type", &self.config.backend_type)
            .field("root", &self.config.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageConfig;

    fn memory_backend() -> StorageBackend {
        StorageBackend::new(StorageConfig::memory()).unwrap()
    }

    #[tokio::test]
    async fn write_read_roundtrip() {
        let store = memory_backend();

        store.write("uploads/a.txt", b"hello").await.unwrap();

        let data = store.read("uploads/a.txt").await.unwrap();
        assert_eq!(data.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let store = memory_backend();

        let err = store.read("uploads/missing.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn exists_reflects_writes_and_deletes() {
        let store = memory_backend();

        assert!(!store.exists("uploads/a.txt").await.unwrap());

        store.write("uploads/a.txt", b"x").await.unwrap();
        assert!(store.exists("uploads/a.txt").await.unwrap());

        store.delete("uploads/a.txt").await.unwrap();
        assert!(!store.exists("uploads/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn list_skips_directory_markers() {
        let store = memory_backend();

        store.create_dir("uploads/").await.unwrap();
        store.write("uploads/a.zip", b"a").await.unwrap();
        store.write("uploads/b.txt", b"b").await.unwrap();

        let mut keys: Vec<String> = store
            .list("uploads/", None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        keys.sort();

        assert_eq!(keys, vec!["uploads/a.zip", "uploads/b.txt"]);
    }

    #[tokio::test]
    async fn list_honors_limit() {
        let store = memory_backend();

        store.write("uploads/a.zip", b"a").await.unwrap();
        store.write("uploads/b.zip", b"b").await.unwrap();
        store.write("uploads/c.zip", b"c").await.unwrap();

        let entries = store.list("uploads/", Some(2)).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn exists_prefix_sees_markers_and_objects() {
        let store = memory_backend();

        assert!(!store.exists_prefix("archive/").await.unwrap());

        store.create_dir("archive/").await.unwrap();
        assert!(store.exists_prefix("archive/").await.unwrap());
    }

    #[tokio::test]
    async fn create_dir_rejects_file_paths() {
        let store = memory_backend();

        let err = store.create_dir("archive").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn copy_leaves_source_in_place() {
        let store = memory_backend();

        store.write("uploads/a.zip", b"payload").await.unwrap();
        store.copy("uploads/a.zip", "archive/a.zip").await.unwrap();

        assert!(store.exists("uploads/a.zip").await.unwrap());
        let copied = store.read("archive/a.zip").await.unwrap();
        assert_eq!(copied.as_ref(), b"payload");
    }

    #[tokio::test]
    async fn download_and_upload_file_roundtrip() {
        let store = memory_backend();
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("nested").join("a.bin");

        store.write("uploads/a.bin", b"bytes").await.unwrap();

        let size = store.download_to_file("uploads/a.bin", &local).await.unwrap();
        assert_eq!(size, 5);
        assert_eq!(std::fs::read(&local).unwrap(), b"bytes");

        store.upload_file(&local, "results/a.bin").await.unwrap();
        let uploaded = store.read("results/a.bin").await.unwrap();
        assert_eq!(uploaded.as_ref(), b"bytes");
    }
}
