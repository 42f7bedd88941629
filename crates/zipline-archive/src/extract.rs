//! Zip extraction.

use std::fs::File;
use std::path::Path;

use crate::TRACING_TARGET;
use crate::error::{ArchiveError, ArchiveResult};

/// Extractor over a staged zip file.
///
/// Opening validates the archive structure; a byte stream that is not a
/// valid zip fails with [`ArchiveError::Corrupted`] before any entry is
/// touched.
#[derive(Debug)]
pub struct ZipExtractor {
    archive: zip::ZipArchive<File>,
}

impl ZipExtractor {
    /// Opens a staged zip file and validates its central directory.
    pub fn open(path: &Path) -> ArchiveResult<Self> {
        let file = File::open(path)?;
        let archive = zip::ZipArchive::new(file).map_err(|_| ArchiveError::Corrupted)?;

        Ok(Self { archive })
    }

    /// Returns the number of entries in the archive.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Returns whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Extracts every entry into the destination directory, preserving
    /// relative paths. Returns the number of file entries written.
    ///
    /// Entry names that would resolve outside the destination are rejected
    /// with [`ArchiveError::UnsafeEntryPath`].
    pub fn extract_all(&mut self, dest: &Path) -> ArchiveResult<usize> {
        let mut written = 0usize;

        for index in 0..self.archive.len() {
            let mut entry = self
                .archive
                .by_index(index)
                .map_err(|_| ArchiveError::Corrupted)?;

            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ArchiveError::UnsafeEntryPath(entry.name().to_string()))?;
            let target = dest.join(relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&target).map_err(|source| {
                    ArchiveError::DirectoryCreation {
                        path: target.clone(),
                        source,
                    }
                })?;
                continue;
            }

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    ArchiveError::DirectoryCreation {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }

            let mut output = File::create(&target).map_err(|source| ArchiveError::Extraction {
                path: target.clone(),
                source,
            })?;
            std::io::copy(&mut entry, &mut output).map_err(|source| ArchiveError::Extraction {
                path: target.clone(),
                source,
            })?;

            written += 1;
        }

        tracing::debug!(
            target: TRACING_TARGET,
            dest = %dest.display(),
            entries = written,
            "Archive extracted"
        );

        Ok(written)
    }
}
