use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::error::PipelineError;
use super::worker::{Outcome, join_failure};
use crate::consumer::ConsumerResult;

/// Lazy, unordered sequence of consumer results of one pipeline run
///
/// Yields results until every worker has finished. The first fault is
/// yielded as `Err`, after which the run is cancelled and the stream ends.
/// Call [`ResultStream::shutdown`] to join the producer and the workers;
/// dropping the stream only cancels them.
pub struct ResultStream {
    archive: Arc<str>,
    results: mpsc::Receiver<Outcome>,
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    received: u64,
    finished: bool,
}

impl ResultStream {
    pub(crate) fn new(
        archive: Arc<str>,
        results: mpsc::Receiver<Outcome>,
        tasks: JoinSet<()>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            archive,
            results,
            tasks,
            cancel,
            received: 0,
            finished: false,
        }
    }

    /// Number of results yielded so far
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Cancel whatever is still running and wait for the producer and every
    /// worker to exit
    ///
    /// Returns a `WorkerFault` if a pipeline task itself panicked, which
    /// would otherwise have ended the run silently.
    pub async fn shutdown(mut self) -> Result<(), PipelineError> {
        self.abort();

        let mut fault = None;
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(join_error) = joined
                && join_error.is_panic()
            {
                let message = join_failure(join_error);
                error!(archive = %self.archive, %message, "Pipeline task panicked");
                fault.get_or_insert(PipelineError::WorkerFault {
                    archive: self.archive.to_string(),
                    worker: 0,
                    message,
                });
            }
        }

        debug!(archive = %self.archive, received = self.received, "Pipeline joined");
        fault.map_or(Ok(()), Err)
    }

    fn abort(&mut self) {
        self.finished = true;
        self.cancel.cancel();
        self.results.close();
    }
}

impl Stream for ResultStream {
    type Item = Result<ConsumerResult, PipelineError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match ready!(self.results.poll_recv(cx)) {
            Some(Ok(result)) => {
                self.received += 1;
                Poll::Ready(Some(Ok(result)))
            }
            Some(Err(error)) => {
                // Results still buffered behind a fault are discarded
                error!(archive = %self.archive, %error, "Pipeline aborted");
                self.abort();
                Poll::Ready(Some(Err(error)))
            }
            None => {
                self.finished = true;
                debug!(archive = %self.archive, received = self.received, "All workers finished");
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
