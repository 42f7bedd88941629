//! Archive error types.

use std::path::PathBuf;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors that can occur while unpacking or staging an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The byte stream is not a structurally valid zip archive.
    #[error("archive is corrupted or not a zip file")]
    Corrupted,

    /// An entry name would resolve outside the extraction root.
    #[error("entry path escapes the extraction root: {0}")]
    UnsafeEntryPath(String),

    /// Writing an extracted entry failed.
    #[error("failed to extract entry to {path}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating a directory in the extraction tree failed.
    #[error("failed to create directory {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
