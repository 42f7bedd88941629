//! Run report accumulation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregate outcome of one pipeline invocation.
///
/// `results` maps every listed key to its entry list; the list is empty for
/// failed archives and for non-archive keys. `relocated` contains a
/// destination key iff that archive's extraction succeeded and the
/// relocation itself did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Number of objects listed under the staging prefix.
    pub candidate_count: usize,
    /// Per-key entry lists, ordered by key.
    pub results: BTreeMap<String, Vec<String>>,
    /// Destination keys of successfully relocated originals.
    pub relocated: Vec<String>,
    /// Human-readable summary of the run.
    pub message: String,
}

impl RunReport {
    /// Report for a run that found nothing under the staging prefix.
    ///
    /// Distinct from an error: the listing succeeded and was empty.
    pub fn no_candidates(staging_prefix: &str) -> Self {
        Self {
            candidate_count: 0,
            results: BTreeMap::new(),
            relocated: Vec::new(),
            message: format!("no objects found under '{staging_prefix}'"),
        }
    }
}

/// Accumulates per-archive outcomes into a [`RunReport`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    candidate_count: usize,
    results: BTreeMap<String, Vec<String>>,
    relocated: Vec<String>,
    failures: usize,
}

impl ReportBuilder {
    /// Creates a builder for a run that listed `candidate_count` objects.
    pub fn new(candidate_count: usize) -> Self {
        Self {
            candidate_count,
            ..Self::default()
        }
    }

    /// Records a successfully processed archive and its entry list.
    pub fn record_success(&mut self, key: &str, entries: Vec<String>) {
        self.results.insert(key.to_string(), entries);
    }

    /// Records a failed archive; its entry list is empty.
    pub fn record_failure(&mut self, key: &str) {
        self.results.insert(key.to_string(), Vec::new());
        self.failures += 1;
    }

    /// Records a listed key that is not an archive candidate.
    pub fn record_skipped(&mut self, key: &str) {
        self.results.insert(key.to_string(), Vec::new());
    }

    /// Records the destination key of a relocated original.
    pub fn record_relocated(&mut self, destination: String) {
        self.relocated.push(destination);
    }

    /// Returns how many archives failed so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Produces the final immutable report.
    pub fn finish(self) -> RunReport {
        let message = if self.failures == 0 {
            "all archives processed successfully".to_string()
        } else {
            format!("{} archive(s) failed during processing", self.failures)
        };

        RunReport {
            candidate_count: self.candidate_count,
            results: self.results,
            relocated: self.relocated,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_failure_entries() {
        let mut builder = ReportBuilder::new(3);
        builder.record_success("uploads/a.zip", vec!["a.txt".to_string()]);
        builder.record_failure("uploads/b.zip");
        builder.record_skipped("uploads/notes.txt");
        builder.record_relocated("archive/a.zip".to_string());

        let report = builder.finish();

        assert_eq!(report.candidate_count, 3);
        assert_eq!(report.results["uploads/a.zip"], vec!["a.txt"]);
        assert!(report.results["uploads/b.zip"].is_empty());
        assert!(report.results["uploads/notes.txt"].is_empty());
        assert_eq!(report.relocated, vec!["archive/a.zip"]);
        assert_eq!(report.message, "1 archive(s) failed during processing");
    }

    #[test]
    fn clean_run_message() {
        let mut builder = ReportBuilder::new(1);
        builder.record_success("uploads/a.zip", Vec::new());

        let report = builder.finish();
        assert_eq!(report.message, "all archives processed successfully");
    }

    #[test]
    fn no_candidates_report_is_empty() {
        let report = RunReport::no_candidates("uploads/");

        assert_eq!(report.candidate_count, 0);
        assert!(report.results.is_empty());
        assert!(report.relocated.is_empty());
        assert!(report.message.contains("uploads/"));
    }
}
