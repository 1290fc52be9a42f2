use super::extract::IdentifierExtractor;
use super::result::{ConsumerResult, PASS_MARKER};
use super::{Consumer, ConsumerError};
use crate::archive::DEFAULT_TERMINATOR;

/// Regression consumer: the result is the record length in characters
pub struct RecordLength<E> {
    extractor: E,
}

impl<E: IdentifierExtractor> RecordLength<E> {
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }
}

impl<E: IdentifierExtractor> Consumer for RecordLength<E> {
    fn consume(&self, record: &str) -> Result<ConsumerResult, ConsumerError> {
        Ok(ConsumerResult::new(
            self.extractor.extract(record),
            "regression",
            record.chars().count().to_string(),
        ))
    }
}

/// Invariance consumer checking that a record is closed by its terminator
/// line and carries an identifier
pub struct TerminatorCheck<E> {
    extractor: E,
    terminator: String,
}

impl<E: IdentifierExtractor> TerminatorCheck<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            terminator: DEFAULT_TERMINATOR.to_string(),
        }
    }

    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }
}

impl<E: IdentifierExtractor> Consumer for TerminatorCheck<E> {
    fn consume(&self, record: &str) -> Result<ConsumerResult, ConsumerError> {
        let identifier = self.extractor.extract(record);
        let last_line = record.lines().rev().find(|line| !line.trim().is_empty());

        let verdict = if identifier.is_empty() {
            "record has no identifier".to_string()
        } else if last_line.map(str::trim) != Some(self.terminator.as_str()) {
            format!("record does not end with '{}'", self.terminator)
        } else {
            PASS_MARKER.to_string()
        };

        Ok(ConsumerResult::new(identifier, "invariance", verdict))
    }
}
