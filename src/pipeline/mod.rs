pub mod config;
pub mod error;
pub mod stream;
mod worker;

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::archive::RecordReader;
use crate::consumer::Consumer;
use worker::{Worker, produce};

// Re-export commonly used types
pub use config::{DEFAULT_WORKERS, PipelineConfig};
pub use error::PipelineError;
pub use stream::ResultStream;

/// Streams archive records through a fixed pool of parallel workers
///
/// ```text
/// RecordReader ──▶ producer ──▶ work queue ──▶ worker × N ──▶ result channel ──▶ ResultStream
/// ```
///
/// The queue and the result channel are bounded, so the number of records
/// held in memory does not depend on the size of the archive.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Process a gzipped SD archive
    ///
    /// Must be called from within a tokio runtime. Fails immediately if the
    /// archive cannot be opened; later faults are yielded by the stream.
    ///
    /// # Example
    /// ```rust,ignore
    /// let mut results = Pipeline::new(PipelineConfig::new().with_workers(4))
    ///     .run("mcule_20000.sdf.gz", Arc::new(RecordLength::new(first_token)))?;
    ///
    /// while let Some(result) = results.next().await {
    ///     let result = result?;
    /// }
    /// results.shutdown().await?;
    /// ```
    pub fn run<C: Consumer>(
        &self,
        archive: impl AsRef<Path>,
        consumer: Arc<C>,
    ) -> Result<ResultStream, PipelineError> {
        let path = archive.as_ref();
        let label = path.display().to_string();

        let records = RecordReader::open(path)
            .map_err(|source| PipelineError::Archive {
                archive: label.clone(),
                source,
            })?
            .with_terminator(self.config.terminator());

        Ok(self.run_records(label, records, consumer))
    }

    /// Process records from any source
    ///
    /// `label` names the source in errors and logs.
    pub fn run_records<I, C>(&self, label: impl Into<String>, records: I, consumer: Arc<C>) -> ResultStream
    where
        I: Iterator<Item = io::Result<String>> + Send + 'static,
        C: Consumer,
    {
        let archive: Arc<str> = Arc::from(label.into());
        let workers = self.config.workers();
        let capacity = self.config.queue_capacity();

        let (work_tx, work_rx) = mpsc::channel(capacity);
        let (results_tx, results_rx) = mpsc::channel(capacity);
        let queue = Arc::new(Mutex::new(work_rx));
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        info!(archive = %archive, workers, capacity, "Starting pipeline");

        for id in 0..workers {
            let worker = Worker {
                id,
                archive: Arc::clone(&archive),
                consumer: Arc::clone(&consumer),
                queue: Arc::clone(&queue),
                results: results_tx.clone(),
                cancel: cancel.clone(),
            };
            tasks.spawn(worker.run());
        }

        // Workers own the queue from here on: once they are gone the
        // producer's sends fail instead of blocking forever.
        drop(queue);

        let producer_archive = Arc::clone(&archive);
        let producer_cancel = cancel.clone();
        tasks.spawn_blocking(move || {
            produce(records, work_tx, results_tx, producer_archive, producer_cancel)
        });

        ResultStream::new(archive, results_rx, tasks, cancel)
    }
}
