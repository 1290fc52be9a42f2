use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use crate::consumer::ConsumerResult;

/// Structured record of one failed comparison or self-check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub time: String,
    pub identifier: String,
    pub archive: String,
    pub info: String,
    #[serde(flatten)]
    pub detail: FailureDetail,
}

/// What went wrong for the identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDetail {
    /// Regression: current value differs from the reference
    Diff { current: String, reference: String },
    /// Invariance: the consumer's own failure description
    Result(String),
}

impl FailureEntry {
    pub fn mismatch(archive: &str, current: &ConsumerResult, reference: &str) -> Self {
        Self {
            time: current.time.clone(),
            identifier: current.identifier.clone(),
            archive: archive.to_string(),
            info: current.info.clone(),
            detail: FailureDetail::Diff {
                current: current.result.clone(),
                reference: reference.to_string(),
            },
        }
    }

    pub fn invariance(archive: &str, result: &ConsumerResult) -> Self {
        Self {
            time: result.time.clone(),
            identifier: result.identifier.clone(),
            archive: archive.to_string(),
            info: result.info.clone(),
            detail: FailureDetail::Result(result.result.clone()),
        }
    }

    /// Test protocol this failure belongs to
    pub fn kind(&self) -> &'static str {
        match self.detail {
            FailureDetail::Diff { .. } => "regression",
            FailureDetail::Result(_) => "invariance",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Receives every failure of a run
///
/// Injected into the driver so each run decides where failures go.
pub trait FailureReporter: Send + Sync {
    fn report(&self, entry: &FailureEntry);
}

/// Emit failures as structured log events (target `sdfcheck::failure`)
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, entry: &FailureEntry) {
        match entry.to_json() {
            Ok(json) => info!(target: "sdfcheck::failure", kind = entry.kind(), entry = %json, "{} test failed", entry.kind()),
            Err(error) => warn!(identifier = %entry.identifier, %error, "Could not serialize failure entry"),
        }
    }
}

/// Discard failures; the verdict still reflects them
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl FailureReporter for SilentReporter {
    fn report(&self, _entry: &FailureEntry) {}
}

/// Keep failures in memory for later inspection
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    entries: Arc<Mutex<Vec<FailureEntry>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures reported so far, in report order
    pub fn entries(&self) -> Vec<FailureEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FailureReporter for CollectingReporter {
    fn report(&self, entry: &FailureEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> ConsumerResult {
        ConsumerResult::new("B", "regression", "8").with_time("2024-05-01T12:00:00")
    }

    #[test]
    fn mismatch_serializes_diff() {
        let entry = FailureEntry::mismatch("abc.sdf.gz", &current(), "7");

        assert_eq!(entry.kind(), "regression");
        assert_eq!(
            entry.to_json().unwrap(),
            r#"{"time":"2024-05-01T12:00:00","identifier":"B","archive":"abc.sdf.gz","info":"regression","diff":{"current":"8","reference":"7"}}"#
        );
    }

    #[test]
    fn invariance_serializes_result() {
        let result = ConsumerResult::new("B", "invariance", "stereo lost").with_time("2024-05-01T12:00:00");
        let entry = FailureEntry::invariance("abc.sdf.gz", &result);

        assert_eq!(entry.kind(), "invariance");
        assert!(entry.to_json().unwrap().ends_with(r#""result":"stereo lost"}"#));
    }

    #[test]
    fn collecting_reporter_shares_entries_between_clones() {
        let reporter = CollectingReporter::new();
        let handle = reporter.clone();

        reporter.report(&FailureEntry::mismatch("x", &current(), "7"));

        assert_eq!(handle.entries().len(), 1);
        assert_eq!(handle.entries()[0].identifier, "B");
    }

    #[test]
    fn tracing_and_silent_reporters_accept_entries() {
        let entry = FailureEntry::mismatch("x", &current(), "7");
        TracingReporter.report(&entry);
        SilentReporter.report(&entry);
    }
}
