#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod extract;
mod staging;
mod walk;

pub use error::{ArchiveError, ArchiveResult};
pub use extract::ZipExtractor;
pub use staging::StagingArea;
pub use walk::collect_entries;

/// Tracing target for archive operations.
pub const TRACING_TARGET: &str = "zipline_archive";

/// Recognized archive suffix, matched case-sensitively.
pub const ARCHIVE_SUFFIX: &str = ".zip";
