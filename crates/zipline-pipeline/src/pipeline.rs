//! Pipeline orchestration.

use zipline_archive::{ARCHIVE_SUFFIX, ArchiveError, ZipExtractor, collect_entries};
use zipline_store::{StorageBackend, StorageError};

use crate::TRACING_TARGET;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::record::ArchiveRecord;
use crate::report::{ReportBuilder, RunReport};

/// Outcome of processing one archive.
struct ArchiveOutcome {
    /// Entry paths republished under the results prefix.
    entries: Vec<String>,
    /// Destination key of the relocated original, when relocation succeeded.
    relocated: Option<String>,
}

/// Drives archives from the staging prefix through unpack, republish,
/// relocation, and cleanup.
///
/// The store client is constructed by the caller and passed in; the
/// pipeline holds no ambient global state. Candidates are processed
/// sequentially; a per-archive failure is recorded and never aborts the
/// remaining candidates.
#[derive(Debug, Clone)]
pub struct Pipeline {
    store: StorageBackend,
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline over an explicit store client.
    pub fn new(store: StorageBackend, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Returns the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes the full current candidate set and returns the run report.
    ///
    /// Fails only when the staging prefix cannot be listed; every
    /// per-archive failure is recorded in the report instead.
    pub async fn run(&self) -> Result<RunReport> {
        if let Err(error) = self.ensure_retention_namespace().await {
            tracing::warn!(
                target: TRACING_TARGET,
                cause = error.cause_str(),
                error = %error,
                "Retention namespace preparation failed; continuing"
            );
        }

        let listed = self
            .store
            .list(&self.config.staging_prefix, self.config.max_candidates)
            .await
            .map_err(|source| PipelineError::Listing { source })?;

        if listed.is_empty() {
            tracing::info!(
                target: TRACING_TARGET,
                prefix = %self.config.staging_prefix,
                "No objects found under the staging prefix"
            );
            return Ok(RunReport::no_candidates(&self.config.staging_prefix));
        }

        tracing::info!(
            target: TRACING_TARGET,
            prefix = %self.config.staging_prefix,
            count = listed.len(),
            "Processing candidate set"
        );

        let mut report = ReportBuilder::new(listed.len());

        for object in &listed {
            let key = object.key.as_str();

            // Not an archive: counted, but no staging and no cleanup.
            if !key.ends_with(ARCHIVE_SUFFIX) {
                tracing::debug!(
                    target: TRACING_TARGET,
                    key = %key,
                    "Skipping non-archive object"
                );
                report.record_skipped(key);
                continue;
            }

            match self.process_archive(key).await {
                Ok(outcome) => {
                    tracing::info!(
                        target: TRACING_TARGET,
                        key = %key,
                        entries = outcome.entries.len(),
                        relocated = outcome.relocated.is_some(),
                        "Archive processed"
                    );
                    report.record_success(key, outcome.entries);
                    if let Some(destination) = outcome.relocated {
                        report.record_relocated(destination);
                    }
                }
                Err(error) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        key = %key,
                        cause = error.cause_str(),
                        error = %error,
                        "Archive processing failed"
                    );
                    report.record_failure(key);
                }
            }
        }

        Ok(report.finish())
    }

    /// Ensures the retention namespace exists, creating its marker when
    /// absent. Idempotent; repeated calls produce no additional side
    /// effects once the marker exists.
    pub async fn ensure_retention_namespace(&self) -> Result<()> {
        let prefix = self.config.retention_prefix.as_str();

        let exists = self
            .store
            .exists_prefix(prefix)
            .await
            .map_err(|source| PipelineError::NamespacePrep {
                prefix: prefix.to_string(),
                source,
            })?;

        if exists {
            tracing::debug!(
                target: TRACING_TARGET,
                prefix = %prefix,
                "Retention namespace already exists"
            );
            return Ok(());
        }

        self.store
            .create_dir(prefix)
            .await
            .map_err(|source| PipelineError::NamespacePrep {
                prefix: prefix.to_string(),
                source,
            })?;

        tracing::info!(
            target: TRACING_TARGET,
            prefix = %prefix,
            "Retention namespace created"
        );

        Ok(())
    }

    /// Runs one archive through the pipeline states. Local staging paths
    /// are removed unconditionally before this returns.
    async fn process_archive(&self, key: &str) -> Result<ArchiveOutcome> {
        let record = ArchiveRecord::derive(key, &self.config.work_dir)?;

        self.check_archive_namespace(&record).await;

        let staged = self.stage_unpack_republish(&record).await;

        let outcome = match staged {
            Ok(entries) => {
                let relocated = match self.relocate_original(&record).await {
                    Ok(destination) => Some(destination),
                    Err(error) => {
                        // Best-effort boundary: the original stays in the
                        // staging prefix rather than being lost.
                        tracing::warn!(
                            target: TRACING_TARGET,
                            key = %record.key(),
                            cause = error.cause_str(),
                            error = %error,
                            "Relocation failed; original left in staging"
                        );
                        None
                    }
                };
                Ok(ArchiveOutcome { entries, relocated })
            }
            Err(error) => Err(error),
        };

        record.staging().cleanup().await;

        outcome
    }

    /// Observational check of the per-archive namespace under the results
    /// prefix. Logs only; creates nothing and never fails the pipeline.
    async fn check_archive_namespace(&self, record: &ArchiveRecord) {
        let prefix = record.namespace_prefix(&self.config.results_prefix);

        match self.store.exists_prefix(&prefix).await {
            Ok(exists) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    prefix = %prefix,
                    exists = exists,
                    "Archive namespace checked"
                );
            }
            Err(source) => {
                let error = PipelineError::NamespacePrep { prefix, source };
                tracing::warn!(
                    target: TRACING_TARGET,
                    key = %record.key(),
                    cause = error.cause_str(),
                    error = %error,
                    "Archive namespace check failed; continuing"
                );
            }
        }
    }

    /// Stage, Unpack, Enumerate, and Republish states.
    async fn stage_unpack_republish(&self, record: &ArchiveRecord) -> Result<Vec<String>> {
        let staging = record.staging();
        let key = record.key();

        staging
            .prepare()
            .await
            .map_err(|source| PipelineError::Download {
                key: key.to_string(),
                source: StorageError::Io(std::io::Error::other(source)),
            })?;

        self.store
            .download_to_file(key, staging.archive_path())
            .await
            .map_err(|source| PipelineError::Download {
                key: key.to_string(),
                source,
            })?;

        let entries = self.unpack_and_enumerate(record).await?;

        for entry in &entries {
            let local = staging.extract_dir().join(entry);
            let destination = format!("{}{entry}", self.config.results_prefix);

            self.store
                .upload_file(&local, &destination)
                .await
                .map_err(|source| PipelineError::Upload {
                    key: key.to_string(),
                    entry: entry.clone(),
                    source,
                })?;
        }

        Ok(entries)
    }

    /// Extracts the staged archive and enumerates the resulting files on
    /// the blocking pool.
    async fn unpack_and_enumerate(&self, record: &ArchiveRecord) -> Result<Vec<String>> {
        let key = record.key().to_string();
        let archive_path = record.staging().archive_path().to_path_buf();
        let extract_dir = record.staging().extract_dir().to_path_buf();

        let unpacked = tokio::task::spawn_blocking(move || {
            let mut extractor = ZipExtractor::open(&archive_path)?;
            extractor.extract_all(&extract_dir)?;
            collect_entries(&extract_dir)
        })
        .await;

        match unpacked {
            Ok(Ok(entries)) => Ok(entries),
            Ok(Err(ArchiveError::Corrupted)) => Err(PipelineError::CorruptArchive { key }),
            Ok(Err(source)) => Err(PipelineError::Extract { key, source }),
            Err(join_error) => Err(PipelineError::Extract {
                key,
                source: ArchiveError::Io(std::io::Error::other(join_error)),
            }),
        }
    }

    /// RelocateOriginal state: copy to retention, then delete the source.
    ///
    /// The delete is only attempted after the copy has been observed to
    /// succeed, so a copy failure can never lose the original.
    async fn relocate_original(&self, record: &ArchiveRecord) -> Result<String> {
        let source_key = record.key();
        let destination = record.retention_key(&self.config.retention_prefix);

        self.store
            .copy(source_key, &destination)
            .await
            .map_err(|source| PipelineError::Relocate {
                key: source_key.to_string(),
                destination: destination.clone(),
                source,
            })?;

        self.store
            .delete(source_key)
            .await
            .map_err(|source| PipelineError::Relocate {
                key: source_key.to_string(),
                destination: destination.clone(),
                source,
            })?;

        tracing::debug!(
            target: TRACING_TARGET,
            from = %source_key,
            to = %destination,
            "Original relocated to retention"
        );

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use zipline_store::StorageConfig;

    use super::*;

    fn memory_pipeline(work_dir: &Path) -> Pipeline {
        let store = StorageBackend::new(StorageConfig::memory()).unwrap();
        let config = PipelineConfig::new().with_work_dir(work_dir);
        Pipeline::new(store, config).unwrap()
    }

    #[tokio::test]
    async fn relocate_deletes_source_only_after_copy() {
        let work_dir = tempfile::tempdir().unwrap();
        let pipeline = memory_pipeline(work_dir.path());

        pipeline
            .store
            .write("uploads/data.zip", b"payload")
            .await
            .unwrap();

        let record = ArchiveRecord::derive("uploads/data.zip", work_dir.path()).unwrap();
        let destination = pipeline.relocate_original(&record).await.unwrap();

        assert_eq!(destination, "archive/data.zip");
        assert!(!pipeline.store.exists("uploads/data.zip").await.unwrap());
        assert!(pipeline.store.exists("archive/data.zip").await.unwrap());
    }

    #[tokio::test]
    async fn failed_copy_leaves_source_in_staging() {
        let root = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();

        let store =
            StorageBackend::new(StorageConfig::fs(root.path().to_string_lossy())).unwrap();
        let config = PipelineConfig::new().with_work_dir(work_dir.path());
        let pipeline = Pipeline::new(store, config).unwrap();

        pipeline
            .store
            .write("uploads/data.zip", b"payload")
            .await
            .unwrap();

        // A regular file occupies the retention path, so the copy cannot
        // create its destination and the delete step is never reached.
        std::fs::write(root.path().join("archive"), b"occupied").unwrap();

        let record = ArchiveRecord::derive("uploads/data.zip", work_dir.path()).unwrap();
        let result = pipeline.relocate_original(&record).await;

        assert!(matches!(result, Err(PipelineError::Relocate { .. })));
        assert!(pipeline.store.exists("uploads/data.zip").await.unwrap());
    }

    #[tokio::test]
    async fn retention_namespace_creation_is_idempotent() {
        let work_dir = tempfile::tempdir().unwrap();
        let pipeline = memory_pipeline(work_dir.path());

        pipeline.ensure_retention_namespace().await.unwrap();
        let after_first = pipeline.store.list("archive/", None).await.unwrap().len();

        pipeline.ensure_retention_namespace().await.unwrap();
        let after_second = pipeline.store.list("archive/", None).await.unwrap().len();

        assert!(pipeline.store.exists_prefix("archive/").await.unwrap());
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let store = StorageBackend::new(StorageConfig::memory()).unwrap();
        let config = PipelineConfig::new().with_staging_prefix("uploads");

        let result = Pipeline::new(store, config);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
