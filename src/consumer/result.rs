use chrono::Local;
use serde::{Deserialize, Serialize};

/// Result string of a record that passed its check
pub const PASS_MARKER: &str = "passed";

/// Outcome of running a consumer over one record
///
/// `info` describes how the result was produced and `result` is compared
/// verbatim between runs; neither is interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerResult {
    pub identifier: String,
    pub time: String,
    pub info: String,
    pub result: String,
}

impl ConsumerResult {
    /// Create a result stamped with the current local time
    pub fn new(
        identifier: impl Into<String>,
        info: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            time: current_time(),
            info: info.into(),
            result: result.into(),
        }
    }

    /// Replace the timestamp
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    /// Whether the result is the pass marker
    pub fn is_pass(&self) -> bool {
        self.result == PASS_MARKER
    }
}

/// ISO-8601 local time with second precision
pub fn current_time() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}
