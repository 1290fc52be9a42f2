use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::error::DriverError;
use super::report::{FailureEntry, FailureReporter};
use super::{Driver, Verdict, archive_name};
use crate::consumer::Consumer;
use crate::storage::ResultStore;

impl<R: FailureReporter> Driver<R> {
    /// Let a self-checking consumer judge every record
    ///
    /// A result other than `passed` is reported and fails the verdict. Every
    /// result is written to `log`; a repeated identifier aborts the run.
    pub async fn invariance<C, Log>(
        &self,
        archive: impl AsRef<Path>,
        consumer: Arc<C>,
        log: &mut Log,
    ) -> Result<Verdict, DriverError>
    where
        C: Consumer,
        Log: ResultStore + ?Sized,
    {
        let archive = archive.as_ref();
        let name = archive_name(archive);
        let mut seen = HashSet::new();
        let mut failures = 0u64;

        log.create_if_absent()?;

        let checked = self
            .drive(archive, consumer, |result| {
                if !seen.insert(result.identifier.clone()) {
                    return Err(DriverError::DuplicateIdentifier(result.identifier));
                }
                if !result.is_pass() {
                    failures += 1;
                    self.reporter.report(&FailureEntry::invariance(&name, &result));
                }
                log.upsert(result)?;
                Ok(())
            })
            .await?;

        log.flush()?;
        info!(archive = %archive.display(), checked, failures, "Invariance finished");

        Ok(Verdict::from_failures(failures))
    }
}
