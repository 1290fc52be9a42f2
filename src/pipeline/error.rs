use std::io;
use thiserror::Error;

use crate::consumer::ConsumerError;

/// Faults that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not process {archive}: {source}")]
    Archive {
        archive: String,
        #[source]
        source: io::Error,
    },

    #[error("could not process {archive}: {source}")]
    ConsumerException {
        archive: String,
        #[source]
        source: ConsumerError,
    },

    #[error("could not process {archive}: worker {worker} terminated abnormally: {message}")]
    WorkerFault {
        archive: String,
        worker: usize,
        message: String,
    },
}

impl PipelineError {
    /// Archive the failed run was reading
    pub fn archive(&self) -> &str {
        match self {
            Self::Archive { archive, .. } => archive,
            Self::ConsumerException { archive, .. } => archive,
            Self::WorkerFault { archive, .. } => archive,
        }
    }
}
