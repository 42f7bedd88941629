//! CLI configuration management.
//!
//! Configuration is split into two groups:
//!
//! ```text
//! Cli
//! ├── storage: StorageArgs        # Backend, bucket, region, credentials
//! └── pipeline: PipelineConfig    # Prefixes, work dir, candidate cap
//! ```
//!
//! All options can be provided via CLI arguments or environment variables.
//! Use `--help` to see the full list.

use anyhow::{Context, bail};
use clap::{Args, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zipline_pipeline::PipelineConfig;
use zipline_store::StorageConfig;

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "zipline")]
#[command(about = "Unpacks staged zip archives and republishes their contents")]
#[command(version)]
pub struct Cli {
    /// Storage backend configuration.
    #[clap(flatten)]
    pub storage: StorageArgs,

    /// Pipeline prefixes, work directory, and candidate cap.
    #[clap(flatten)]
    pub pipeline: PipelineConfig,

    /// Opaque trigger payload passed by an external scheduler.
    ///
    /// Recorded in the startup log for correlation; its content does not
    /// influence the run.
    #[arg(long = "trigger", env = "ZIPLINE_TRIGGER")]
    pub trigger: Option<String>,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses
    /// CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is
    /// enabled. Must run before clap parses arguments so `env` defaults can
    /// pick the values up.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Logs the effective configuration (no sensitive information).
    pub fn log_config(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            backend = ?self.storage.backend,
            bucket = self.storage.bucket.as_deref().unwrap_or("<none>"),
            endpoint = self.storage.endpoint.as_deref().unwrap_or("<default>"),
            staging_prefix = %self.pipeline.staging_prefix,
            retention_prefix = %self.pipeline.retention_prefix,
            results_prefix = %self.pipeline.results_prefix,
            work_dir = %self.pipeline.work_dir.display(),
            max_candidates = ?self.pipeline.max_candidates,
            "Effective configuration"
        );
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    /// Amazon S3 compatible storage.
    S3,
    /// Local filesystem, mainly for development runs.
    Fs,
    /// In-process storage, requires the `memory` feature.
    Memory,
}

/// Storage backend configuration arguments.
#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    /// Which storage backend to target.
    #[arg(
        long = "backend",
        env = "ZIPLINE_BACKEND",
        value_enum,
        default_value = "s3"
    )]
    pub backend: BackendChoice,

    /// Bucket name (S3) or base directory (fs). Required for both; there
    /// is deliberately no default.
    #[arg(long = "bucket", env = "ZIPLINE_BUCKET")]
    pub bucket: Option<String>,

    /// Region for S3 compatible backends.
    #[arg(long = "region", env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom endpoint URL for S3 compatible backends.
    #[arg(long = "endpoint", env = "ZIPLINE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Static access key id. Falls back to the ambient credential chain
    /// when absent.
    #[arg(
        long = "access-key-id",
        env = "AWS_ACCESS_KEY_ID",
        hide_env_values = true
    )]
    pub access_key_id: Option<String>,

    /// Static secret access key.
    #[arg(
        long = "secret-access-key",
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true
    )]
    pub secret_access_key: Option<String>,
}

impl StorageArgs {
    /// Builds the storage configuration, enforcing that non-memory
    /// backends name a bucket or base directory.
    pub fn to_storage_config(&self) -> anyhow::Result<StorageConfig> {
        let mut config = match self.backend {
            BackendChoice::S3 => {
                let bucket = self
                    .bucket
                    .as_deref()
                    .context("--bucket is required for the s3 backend")?;
                StorageConfig::s3(bucket)
            }
            BackendChoice::Fs => {
                let root = self
                    .bucket
                    .as_deref()
                    .context("--bucket is required for the fs backend")?;
                StorageConfig::fs(root)
            }
            BackendChoice::Memory => StorageConfig::memory(),
        };

        if let Some(ref region) = self.region {
            config = config.with_region(region);
        }

        if let Some(ref endpoint) = self.endpoint {
            config = config.with_endpoint(endpoint);
        }

        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => {
                config = config.with_credentials(id, secret);
            }
            (None, None) => {}
            _ => bail!("--access-key-id and --secret-access-key must be provided together"),
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use zipline_store::BackendType;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("zipline").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_target_s3_with_standard_prefixes() {
        let cli = parse(&["--bucket", "intake-bucket"]);

        assert_eq!(cli.storage.backend, BackendChoice::S3);
        assert_eq!(cli.pipeline.staging_prefix, "uploads/");
        assert_eq!(cli.pipeline.retention_prefix, "archive/");
        assert_eq!(cli.pipeline.results_prefix, "results/");

        let config = cli.storage.to_storage_config().unwrap();
        assert_eq!(config.backend_type, BackendType::S3);
        assert_eq!(config.root, "intake-bucket");
    }

    #[test]
    fn s3_backend_requires_a_bucket() {
        let cli = parse(&[]);
        assert!(cli.storage.to_storage_config().is_err());
    }

    #[test]
    fn credentials_must_come_in_pairs() {
        let cli = parse(&["--bucket", "b", "--access-key-id", "only-half"]);
        assert!(cli.storage.to_storage_config().is_err());

        let cli = parse(&[
            "--bucket",
            "b",
            "--access-key-id",
            "id",
            "--secret-access-key",
            "secret",
        ]);
        let config = cli.storage.to_storage_config().unwrap();
        assert_eq!(config.access_key_id.as_deref(), Some("id"));
    }

    #[test]
    fn prefix_overrides_flow_into_pipeline_config() {
        let cli = parse(&[
            "--bucket",
            "b",
            "--staging-prefix",
            "incoming/",
            "--max-candidates",
            "25",
        ]);

        assert_eq!(cli.pipeline.staging_prefix, "incoming/");
        assert_eq!(cli.pipeline.max_candidates, Some(25));
        assert!(cli.pipeline.validate().is_ok());
    }
}
