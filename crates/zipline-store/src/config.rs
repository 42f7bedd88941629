//! Storage configuration types.

use serde::{Deserialize, Serialize};

/// Supported storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// Amazon S3 compatible storage.
    S3,
    /// Local filesystem, mainly for development runs.
    Fs,
    /// In-process storage used by the test suites.
    Memory,
}

/// Storage backend configuration.
///
/// `root` names the bucket (S3), the base directory (Fs), or is unused
/// (Memory). There is deliberately no default bucket identifier; callers
/// must provide one at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to construct.
    pub backend_type: BackendType,
    /// Bucket or container identifier (base directory for Fs).
    pub root: String,
    /// Region, for S3 compatible backends.
    pub region: Option<String>,
    /// Custom endpoint URL, for S3 compatible backends.
    pub endpoint: Option<String>,
    /// Static access key id. Falls back to the ambient credential chain
    /// when absent.
    pub access_key_id: Option<String>,
    /// Static secret access key.
    pub secret_access_key: Option<String>,
}

impl StorageConfig {
    /// Creates an S3 configuration for the given bucket.
    pub fn s3(bucket: impl Into<String>) -> Self {
        Self {
            backend_type: BackendType::S3,
            root: bucket.into(),
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }

    /// Creates a filesystem configuration rooted at the given directory.
    pub fn fs(root: impl Into<String>) -> Self {
        Self {
            backend_type: BackendType::Fs,
            root: root.into(),
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }

    /// Creates an in-memory configuration.
    pub fn memory() -> Self {
        Self {
            backend_type: BackendType::Memory,
            root: String::new(),
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets static credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> crate::StorageResult<()> {
        if self.backend_type != BackendType::Memory && self.root.is_empty() {
            return Err(crate::StorageError::init(
                "bucket or container identifier must not be empty",
            ));
        }

        Ok(())
    }
}
