#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;
mod pipeline;
mod record;
mod report;

pub use config::{
    DEFAULT_RESULTS_PREFIX, DEFAULT_RETENTION_PREFIX, DEFAULT_STAGING_PREFIX, PipelineConfig,
};
pub use error::{FailureCause, PipelineError, Result};
pub use pipeline::Pipeline;
pub use record::ArchiveRecord;
pub use report::{ReportBuilder, RunReport};

/// Tracing target for pipeline orchestration.
pub const TRACING_TARGET: &str = "zipline_pipeline";
