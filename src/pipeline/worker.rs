use std::any::Any;
use std::io;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::error::PipelineError;
use crate::consumer::{Consumer, ConsumerResult};

/// What a worker reports for one record
pub(crate) type Outcome = Result<ConsumerResult, PipelineError>;

/// Work queue receiver shared by all workers of a run
pub(crate) type WorkQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// One execution unit of the pool
///
/// Pulls a record, runs the consumer on the blocking thread pool and forwards
/// the outcome. Stops when the queue is closed and drained, when the run is
/// cancelled, or after reporting a fault. Dropping the result sender on exit
/// is the worker's completion signal.
pub(crate) struct Worker<C> {
    pub(crate) id: usize,
    pub(crate) archive: Arc<str>,
    pub(crate) consumer: Arc<C>,
    pub(crate) queue: WorkQueue,
    pub(crate) results: mpsc::Sender<Outcome>,
    pub(crate) cancel: CancellationToken,
}

impl<C: Consumer> Worker<C> {
    pub(crate) async fn run(self) {
        let mut processed = 0u64;

        loop {
            let record = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                record = next_record(&self.queue) => record,
            };
            let Some(record) = record else {
                break;
            };

            let outcome = self.process(record).await;
            let fatal = outcome.is_err();

            if self.results.send(outcome).await.is_err() || fatal {
                break;
            }
            processed += 1;
        }

        debug!(worker = self.id, processed, "Worker finished");
    }

    async fn process(&self, record: String) -> Outcome {
        let consumer = Arc::clone(&self.consumer);

        match tokio::task::spawn_blocking(move || consumer.consume(&record)).await {
            Ok(Ok(result)) => {
                trace!(worker = self.id, identifier = %result.identifier, "Record processed");
                Ok(result)
            }
            Ok(Err(source)) => Err(PipelineError::ConsumerException {
                archive: self.archive.to_string(),
                source,
            }),
            Err(join_error) => Err(PipelineError::WorkerFault {
                archive: self.archive.to_string(),
                worker: self.id,
                message: join_failure(join_error),
            }),
        }
    }
}

async fn next_record(queue: &WorkQueue) -> Option<String> {
    queue.lock().await.recv().await
}

/// Feed records into the work queue until the source is exhausted
///
/// Runs on a blocking thread. A read failure is reported on the result
/// channel and ends production; so do cancellation and a closed queue.
pub(crate) fn produce<I>(
    records: I,
    work: mpsc::Sender<String>,
    results: mpsc::Sender<Outcome>,
    archive: Arc<str>,
    cancel: CancellationToken,
) where
    I: Iterator<Item = io::Result<String>>,
{
    let mut produced = 0u64;

    for record in records {
        if cancel.is_cancelled() {
            break;
        }
        match record {
            Ok(record) => {
                if work.blocking_send(record).is_err() {
                    break;
                }
                produced += 1;
            }
            Err(source) => {
                let _ = results.blocking_send(Err(PipelineError::Archive {
                    archive: archive.to_string(),
                    source,
                }));
                break;
            }
        }
    }

    debug!(archive = %archive, produced, "Producer finished");
}

/// Human-readable cause of an abnormally terminated task
pub(crate) fn join_failure(error: JoinError) -> String {
    if error.is_cancelled() {
        return "task was cancelled".to_string();
    }
    match error.try_into_panic() {
        Ok(payload) => panic_message(payload.as_ref()),
        Err(error) => error.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}
