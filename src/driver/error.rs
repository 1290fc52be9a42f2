use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::storage::StorageError;

/// Identifiers listed in an `IncompleteCoverage` message
const COVERAGE_PREVIEW: usize = 10;

/// Errors that abort a driver run before it can produce a verdict
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Identifier {0} has been processed multiple times")]
    DuplicateIdentifier(String),

    #[error("Couldn't find identifier {0} in reference")]
    UnknownIdentifier(String),

    #[error(
        "Reference contains {} identifiers that haven't been processed: {}",
        .0.len(),
        preview(.0)
    )]
    IncompleteCoverage(Vec<String>),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for DriverError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::DuplicateIdentifier(identifier) => Self::DuplicateIdentifier(identifier),
            other => Self::Storage(other),
        }
    }
}

fn preview(identifiers: &[String]) -> String {
    let mut shown = identifiers
        .iter()
        .take(COVERAGE_PREVIEW)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if identifiers.len() > COVERAGE_PREVIEW {
        shown.push_str(", ...");
    }
    shown
}
