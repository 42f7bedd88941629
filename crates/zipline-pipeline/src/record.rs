//! Per-archive processing record.

use std::path::Path;

use zipline_archive::{ARCHIVE_SUFFIX, StagingArea};

use crate::error::{PipelineError, Result};

/// Identity and derived local paths for one archive being processed.
///
/// Created when the pipeline begins processing a listed candidate; its
/// staging paths are removed unconditionally at the end of processing,
/// regardless of outcome.
#[derive(Debug, Clone)]
pub struct ArchiveRecord {
    key: String,
    base_name: String,
    staging: StagingArea,
}

impl ArchiveRecord {
    /// Derives a record from a candidate key.
    ///
    /// The base name is the key's basename with the archive suffix
    /// stripped; a key that yields an empty base name is malformed.
    pub fn derive(key: &str, work_dir: &Path) -> Result<Self> {
        let basename = key.rsplit('/').next().unwrap_or(key);
        let base_name = basename
            .strip_suffix(ARCHIVE_SUFFIX)
            .filter(|base| !base.is_empty())
            .ok_or_else(|| PipelineError::InvalidKey {
                key: key.to_string(),
            })?;

        Ok(Self {
            key: key.to_string(),
            base_name: base_name.to_string(),
            staging: StagingArea::new(work_dir, base_name),
        })
    }

    /// Remote key of the source archive.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Base name (basename without the archive suffix).
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Local staging paths for this archive.
    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Destination key for relocating the original into retention.
    pub fn retention_key(&self, retention_prefix: &str) -> String {
        format!("{retention_prefix}{}{ARCHIVE_SUFFIX}", self.base_name)
    }

    /// Per-archive namespace prefix under the results prefix.
    pub fn namespace_prefix(&self, results_prefix: &str) -> String {
        format!("{results_prefix}{}/", self.base_name)
    }
}
