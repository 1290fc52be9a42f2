use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::error::DriverError;
use super::report::{FailureEntry, FailureReporter};
use super::{Driver, Verdict, archive_name};
use crate::consumer::{Consumer, ConsumerResult, PASS_MARKER};
use crate::storage::ResultStore;

impl<R: FailureReporter> Driver<R> {
    /// Compare every result with a captured `reference`
    ///
    /// Each identifier is looked up in the reference; differing results are
    /// reported and fail the verdict without stopping the run. The outcome
    /// for every identifier is written to `log` (`passed` or the diff).
    ///
    /// Aborts with `DuplicateIdentifier` when an identifier repeats,
    /// `UnknownIdentifier` when the reference lacks one, and
    /// `IncompleteCoverage` when the run did not reproduce every reference
    /// identifier. Identifiers missing from the reference but produced by
    /// this run are not coverage failures.
    pub async fn regression<C, Ref, Log>(
        &self,
        archive: impl AsRef<Path>,
        consumer: Arc<C>,
        reference: &Ref,
        log: &mut Log,
    ) -> Result<Verdict, DriverError>
    where
        C: Consumer,
        Ref: ResultStore + ?Sized,
        Log: ResultStore + ?Sized,
    {
        let archive = archive.as_ref();
        let name = archive_name(archive);
        let mut seen = HashSet::new();
        let mut mismatches = 0u64;

        log.create_if_absent()?;

        let compared = self
            .drive(archive, consumer, |current| {
                if !seen.insert(current.identifier.clone()) {
                    return Err(DriverError::DuplicateIdentifier(current.identifier));
                }

                let expected = reference
                    .lookup(&current.identifier)?
                    .ok_or_else(|| DriverError::UnknownIdentifier(current.identifier.clone()))?;

                let outcome = if current.result == expected.result {
                    PASS_MARKER.to_string()
                } else {
                    mismatches += 1;
                    self.reporter
                        .report(&FailureEntry::mismatch(&name, &current, &expected.result));
                    format!(
                        "current: '{}' != reference: '{}'",
                        current.result, expected.result
                    )
                };

                log.upsert(ConsumerResult {
                    result: outcome,
                    ..current
                })?;
                Ok(())
            })
            .await?;

        log.flush()?;

        let mut missing: Vec<String> = reference
            .identifiers()?
            .difference(&seen)
            .cloned()
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(DriverError::IncompleteCoverage(missing));
        }

        info!(archive = %archive.display(), compared, mismatches, "Regression finished");
        Ok(Verdict::from_failures(mismatches))
    }
}
