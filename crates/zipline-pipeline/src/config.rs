//! Pipeline configuration.

use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Default remote prefix where incoming archives are deposited.
pub const DEFAULT_STAGING_PREFIX: &str = "uploads/";

/// Default remote prefix processed originals are relocated into.
pub const DEFAULT_RETENTION_PREFIX: &str = "archive/";

/// Default remote prefix extracted entries are republished under.
pub const DEFAULT_RESULTS_PREFIX: &str = "results/";

/// Pipeline configuration.
///
/// Prefixes are logical folders and must end with `/`. The work dir holds
/// the per-archive local staging paths; it is shared across runs so the
/// staging step can clear stale state left by an interrupted attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct PipelineConfig {
    /// Remote prefix where incoming archives are deposited.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "staging-prefix",
            env = "ZIPLINE_STAGING_PREFIX",
            default_value = DEFAULT_STAGING_PREFIX
        )
    )]
    #[serde(default = "default_staging_prefix")]
    pub staging_prefix: String,

    /// Remote prefix processed originals are relocated into.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "retention-prefix",
            env = "ZIPLINE_RETENTION_PREFIX",
            default_value = DEFAULT_RETENTION_PREFIX
        )
    )]
    #[serde(default = "default_retention_prefix")]
    pub retention_prefix: String,

    /// Remote prefix extracted entries are republished under.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "results-prefix",
            env = "ZIPLINE_RESULTS_PREFIX",
            default_value = DEFAULT_RESULTS_PREFIX
        )
    )]
    #[serde(default = "default_results_prefix")]
    pub results_prefix: String,

    /// Local directory holding staged archives and extraction trees.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "work-dir",
            env = "ZIPLINE_WORK_DIR",
            default_value_os_t = default_work_dir()
        )
    )]
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Optional cap on how many listed objects are considered per run.
    #[cfg_attr(
        feature = "config",
        arg(long = "max-candidates", env = "ZIPLINE_MAX_CANDIDATES")
    )]
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

fn default_staging_prefix() -> String {
    DEFAULT_STAGING_PREFIX.to_string()
}

fn default_retention_prefix() -> String {
    DEFAULT_RETENTION_PREFIX.to_string()
}

fn default_results_prefix() -> String {
    DEFAULT_RESULTS_PREFIX.to_string()
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("zipline")
}

impl PipelineConfig {
    /// Creates a configuration with the default prefixes and work dir.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the staging prefix.
    pub fn with_staging_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.staging_prefix = prefix.into();
        self
    }

    /// Sets the retention prefix.
    pub fn with_retention_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.retention_prefix = prefix.into();
        self
    }

    /// Sets the results prefix.
    pub fn with_results_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.results_prefix = prefix.into();
        self
    }

    /// Sets the local work directory.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Caps how many listed objects are considered per run.
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = Some(max);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, prefix) in [
            ("staging", &self.staging_prefix),
            ("retention", &self.retention_prefix),
            ("results", &self.results_prefix),
        ] {
            if prefix.is_empty() || !prefix.ends_with('/') {
                return Err(PipelineError::Config(format!(
                    "{name} prefix must be non-empty and end with '/': {prefix:?}"
                )));
            }
        }

        if self.work_dir.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "work dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            staging_prefix: default_staging_prefix(),
            retention_prefix: default_retention_prefix(),
            results_prefix: default_results_prefix(),
            work_dir: default_work_dir(),
            max_candidates: None,
        }
    }
}
