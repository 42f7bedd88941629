//! Pipeline error types.

use strum::{AsRefStr, IntoStaticStr};
use zipline_archive::ArchiveError;
use zipline_store::StorageError;

/// Result type alias for pipeline operations.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Failure cause labels used in logs and reports.
///
/// Per-archive causes mirror the pipeline states; `Listing` and `Config`
/// are run-level and terminate the invocation instead of a single archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureCause {
    /// The archive key could not be decomposed into a usable base name.
    InvalidKey,
    /// Staging the archive locally failed.
    Download,
    /// The staged bytes are not a structurally valid archive.
    CorruptArchive,
    /// Extraction or enumeration of entries failed.
    Extract,
    /// Republishing an extracted entry failed.
    Upload,
    /// Relocating the processed original failed.
    Relocate,
    /// Namespace preparation failed (never fatal).
    NamespacePrep,
    /// Listing the staging prefix failed.
    Listing,
    /// The pipeline configuration is invalid.
    Config,
}

/// Errors raised by the processing pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The key cannot yield a non-empty base name.
    #[error("malformed archive key: {key}")]
    InvalidKey {
        /// Offending remote key.
        key: String,
    },

    /// Downloading the archive to local staging failed.
    #[error("failed to stage {key} locally")]
    Download {
        /// Remote key of the archive being staged.
        key: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// The staged file is not a valid zip archive.
    #[error("archive {key} is corrupted or not a zip file")]
    CorruptArchive {
        /// Remote key of the corrupt archive.
        key: String,
    },

    /// Extracting or enumerating entries failed.
    #[error("failed to extract {key}")]
    Extract {
        /// Remote key of the archive being extracted.
        key: String,
        /// Underlying extraction failure.
        #[source]
        source: ArchiveError,
    },

    /// Republishing an extracted entry failed. Entries uploaded before the
    /// failure are not rolled back.
    #[error("failed to republish entry {entry} of {key}")]
    Upload {
        /// Remote key of the source archive.
        key: String,
        /// Relative path of the entry that failed to upload.
        entry: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// Relocating the original archive failed. The extraction outcome is
    /// unaffected; only the relocation record is omitted.
    #[error("failed to relocate {key} to {destination}")]
    Relocate {
        /// Remote key of the original archive.
        key: String,
        /// Destination key under the retention prefix.
        destination: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// Preparing a remote namespace failed. Never fatal to a run.
    #[error("namespace preparation failed for {prefix}")]
    NamespacePrep {
        /// Prefix whose preparation failed.
        prefix: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// Listing the staging prefix failed; the run cannot proceed.
    #[error("failed to list the staging prefix")]
    Listing {
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// The pipeline configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Returns the failure cause label for this error.
    pub fn cause(&self) -> FailureCause {
        match self {
            Self::InvalidKey { .. } => FailureCause::InvalidKey,
            Self::Download { .. } => FailureCause::Download,
            Self::CorruptArchive { .. } => FailureCause::CorruptArchive,
            Self::Extract { .. } => FailureCause::Extract,
            Self::Upload { .. } => FailureCause::Upload,
            Self::Relocate { .. } => FailureCause::Relocate,
            Self::NamespacePrep { .. } => FailureCause::NamespacePrep,
            Self::Listing { .. } => FailureCause::Listing,
            Self::Config(_) => FailureCause::Config,
        }
    }

    /// Returns the failure cause as a static string for logging.
    pub fn cause_str(&self) -> &'static str {
        self.cause().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cause_labels_are_snake_case() {
        let err = PipelineError::InvalidKey {
            key: "uploads/".to_string(),
        };
        assert_eq!(err.cause_str(), "invalid_key");

        let err = PipelineError::CorruptArchive {
            key: "uploads/x.zip".to_string(),
        };
        assert_eq!(err.cause_str(), "corrupt_archive");
    }
}
