//! Test protocols built on the pipeline
//!
//! - **capture**: store every result as the reference for later runs
//! - **regression**: compare every result with a captured reference
//! - **invariance**: let a self-checking consumer judge every record
//!
//! Record-level failures (mismatches, failed self-checks) are reported and
//! folded into the [`Verdict`]; everything else aborts the run with a
//! [`DriverError`].

pub mod capture;
pub mod error;
pub mod invariance;
pub mod regression;
pub mod report;

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;

use crate::consumer::{Consumer, ConsumerResult};
use crate::pipeline::Pipeline;

// Re-export commonly used types
pub use error::DriverError;
pub use report::{
    CollectingReporter, FailureDetail, FailureEntry, FailureReporter, SilentReporter,
    TracingReporter,
};

/// Outcome of a run that completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    fn from_failures(failures: u64) -> Self {
        if failures == 0 { Self::Passed } else { Self::Failed }
    }

    /// Process exit code: 0 when passed, 1 when failed
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
        }
    }

    /// Combined verdict of several runs
    pub fn and(self, other: Verdict) -> Verdict {
        if self == Self::Passed && other == Self::Passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

/// Runs the test protocols with a fixed pipeline configuration
///
/// # Example
/// ```rust,ignore
/// let driver = Driver::new(Pipeline::new(PipelineConfig::new().with_workers(4)), TracingReporter);
/// let consumer = Arc::new(RecordLength::new(first_token));
///
/// let mut reference = CsvResultStore::open("reference.csv")?;
/// driver.capture("Compound_1.sdf.gz", consumer.clone(), &mut reference).await?;
///
/// let mut log = MemoryResultStore::new();
/// let verdict = driver.regression("Compound_1.sdf.gz", consumer, &reference, &mut log).await?;
/// ```
pub struct Driver<R> {
    pipeline: Pipeline,
    reporter: R,
}

impl<R: FailureReporter> Driver<R> {
    pub fn new(pipeline: Pipeline, reporter: R) -> Self {
        Self { pipeline, reporter }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Run the pipeline over `archive`, handing every result to `handle`
    ///
    /// Stops at the first pipeline fault or handler error. The pipeline is
    /// joined before returning on every path. Returns the number of handled
    /// results.
    async fn drive<C, F>(
        &self,
        archive: &Path,
        consumer: Arc<C>,
        mut handle: F,
    ) -> Result<u64, DriverError>
    where
        C: Consumer,
        F: FnMut(ConsumerResult) -> Result<(), DriverError>,
    {
        let mut results = self.pipeline.run(archive, consumer)?;
        let mut handled = 0u64;

        let outcome = loop {
            match results.next().await {
                Some(Ok(result)) => {
                    if let Err(e) = handle(result) {
                        break Err(e);
                    }
                    handled += 1;
                }
                Some(Err(e)) => break Err(DriverError::from(e)),
                None => break Ok(handled),
            }
        };

        let joined = results.shutdown().await;
        let handled = outcome?;
        joined?;
        Ok(handled)
    }
}

/// File name of the archive as shown in failure entries
fn archive_name(archive: &Path) -> String {
    archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive.display().to_string())
}
