pub mod cli;
pub mod error;
pub mod options;

use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::consumer::{Consumer, RecordLength, TerminatorCheck, first_token};
use crate::driver::{Driver, FailureReporter, Verdict};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::storage::{CsvResultStore, MEMORY_DESTINATION, StorageError, open_store};

// Re-export commonly used types
pub use cli::{CliApp, FATAL_EXIT_CODE};
pub use error::AppError;
pub use options::{Cli, Command, Mode, RunOptions, WORKERS_ENV};

/// Run the selected protocol over every archive with the built-in consumers
///
/// Archives run one after another; the first fatal error stops the run.
pub async fn execute<R: FailureReporter>(
    options: &RunOptions,
    reporter: R,
) -> Result<Verdict, AppError> {
    let driver = Driver::new(
        Pipeline::new(PipelineConfig::new().with_workers(options.workers)),
        reporter,
    );
    let regression = Arc::new(RecordLength::new(first_token));
    let invariance = Arc::new(TerminatorCheck::new(first_token));

    let mut verdict = Verdict::Passed;
    for archive in &options.archives {
        let outcome = match &options.mode {
            Mode::Invariance => {
                run_invariance(&driver, archive, invariance.clone(), options).await?
            }
            Mode::Regression { .. } => {
                run_regression(&driver, archive, regression.clone(), options).await?
            }
            Mode::ComputeReference => {
                run_capture(&driver, archive, regression.clone(), options).await?
            }
        };
        info!(archive = %archive.display(), ?outcome, "Archive finished");
        verdict = verdict.and(outcome);
    }
    Ok(verdict)
}

async fn run_invariance<R, C>(
    driver: &Driver<R>,
    archive: &Path,
    consumer: Arc<C>,
    options: &RunOptions,
) -> Result<Verdict, AppError>
where
    R: FailureReporter,
    C: Consumer,
{
    let mut log = open_store(&options.destination_for(archive))?;
    Ok(driver.invariance(archive, consumer, log.as_mut()).await?)
}

async fn run_regression<R, C>(
    driver: &Driver<R>,
    archive: &Path,
    consumer: Arc<C>,
    options: &RunOptions,
) -> Result<Verdict, AppError>
where
    R: FailureReporter,
    C: Consumer,
{
    let Some(path) = options.reference_for(archive) else {
        return Err(AppError::InvalidArguments("no regression reference".to_string()));
    };
    let reference = match CsvResultStore::open_read_only(&path) {
        Ok(reference) => reference,
        Err(StorageError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Err(AppError::FileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    let mut log = open_store(&options.destination_for(archive))?;

    Ok(driver
        .regression(archive, consumer, &reference, log.as_mut())
        .await?)
}

async fn run_capture<R, C>(
    driver: &Driver<R>,
    archive: &Path,
    consumer: Arc<C>,
    options: &RunOptions,
) -> Result<Verdict, AppError>
where
    R: FailureReporter,
    C: Consumer,
{
    let destination = options.destination_for(archive);
    if destination == MEMORY_DESTINATION {
        warn!(archive = %archive.display(), "Capturing a reference into memory; it is discarded on exit");
    }
    let mut store = open_store(&destination)?;
    Ok(driver.capture(archive, consumer, store.as_mut()).await?)
}
