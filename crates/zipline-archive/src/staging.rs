//! Local staging-area lifecycle.

use std::path::{Path, PathBuf};

use crate::error::ArchiveResult;
use crate::{ARCHIVE_SUFFIX, TRACING_TARGET};

/// Per-archive scratch paths on the local filesystem.
///
/// Paths are derived deterministically from the archive's base name, so a
/// rerun after an interrupted attempt lands on the same locations and
/// [`prepare`](Self::prepare) can clear stale state. The pipeline owns these
/// paths exclusively while an archive is being processed.
#[derive(Debug, Clone)]
pub struct StagingArea {
    archive_path: PathBuf,
    extract_dir: PathBuf,
}

impl StagingArea {
    /// Derives the staging paths for an archive base name under a work dir.
    pub fn new(work_dir: &Path, base_name: &str) -> Self {
        Self {
            archive_path: work_dir.join(format!("{base_name}{ARCHIVE_SUFFIX}")),
            extract_dir: work_dir.join(base_name),
        }
    }

    /// Local path the archive object is downloaded to.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Directory the archive is extracted into.
    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Prepares the staging area for a fresh attempt.
    ///
    /// An extraction directory left behind by an interrupted previous run is
    /// removed entirely before the directory is recreated.
    pub async fn prepare(&self) -> ArchiveResult<()> {
        if tokio::fs::try_exists(&self.extract_dir).await? {
            tracing::debug!(
                target: TRACING_TARGET,
                dir = %self.extract_dir.display(),
                "Removing stale extraction directory"
            );
            tokio::fs::remove_dir_all(&self.extract_dir).await?;
        }

        tokio::fs::create_dir_all(&self.extract_dir).await?;

        Ok(())
    }

    /// Removes the staged archive file and extraction directory.
    ///
    /// Best-effort: failures are logged and swallowed so cleanup can never
    /// mask the outcome of the processing that preceded it.
    pub async fn cleanup(&self) {
        if let Err(error) = remove_file_if_present(&self.archive_path).await {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %self.archive_path.display(),
                error = %error,
                "Failed to remove staged archive file"
            );
        }

        if let Err(error) = remove_dir_if_present(&self.extract_dir).await {
            tracing::warn!(
                target: TRACING_TARGET,
                dir = %self.extract_dir.display(),
                error = %error,
                "Failed to remove extraction directory"
            );
        }
    }
}

async fn remove_file_if_present(path: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(path).await? {
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}

async fn remove_dir_if_present(path: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(path).await? {
        tokio::fs::remove_dir_all(path).await?;
    }
    Ok(())
}
