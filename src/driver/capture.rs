use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::error::DriverError;
use super::report::FailureReporter;
use super::{Driver, Verdict};
use crate::consumer::Consumer;
use crate::storage::ResultStore;

impl<R: FailureReporter> Driver<R> {
    /// Capture a reference: insert every result into `store`
    ///
    /// Identifiers must be unique within the store; a duplicate aborts the
    /// run with `DuplicateIdentifier`. Passes unless the run aborts. An
    /// aborted capture rolls the store back, so it can be retried.
    pub async fn capture<C, S>(
        &self,
        archive: impl AsRef<Path>,
        consumer: Arc<C>,
        store: &mut S,
    ) -> Result<Verdict, DriverError>
    where
        C: Consumer,
        S: ResultStore + ?Sized,
    {
        let archive = archive.as_ref();
        store.create_if_absent()?;

        let outcome = self
            .drive(archive, consumer, |result| {
                store.insert(result)?;
                Ok(())
            })
            .await;
        let outcome = outcome.and_then(|captured| {
            store.flush()?;
            Ok(captured)
        });

        let captured = match outcome {
            Ok(captured) => captured,
            Err(e) => {
                if let Err(error) = store.rollback() {
                    warn!(archive = %archive.display(), %error, "Could not discard partial reference");
                }
                return Err(e);
            }
        };

        info!(archive = %archive.display(), captured, "Reference captured");

        Ok(Verdict::Passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::{ConsumerResult, first_token, from_fn};
    use crate::driver::SilentReporter;
    use crate::driver::fixtures::{body_consumer, record, write_archive};
    use crate::pipeline::{Pipeline, PipelineConfig, PipelineError};
    use crate::storage::{CsvResultStore, MemoryResultStore};

    fn driver() -> Driver<SilentReporter> {
        Driver::new(Pipeline::new(PipelineConfig::new().with_workers(3)), SilentReporter)
    }

    #[tokio::test]
    async fn captures_one_entry_per_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            "abc.sdf.gz",
            &[record("A", "5"), record("B", "7"), record("C", "3")],
        );
        let mut store = MemoryResultStore::new();

        let verdict = driver().capture(&archive, body_consumer(), &mut store).await.unwrap();

        assert_eq!(verdict, Verdict::Passed);
        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup("A").unwrap().unwrap().result, "5");
        assert_eq!(store.lookup("B").unwrap().unwrap().result, "7");
        assert_eq!(store.lookup("C").unwrap().unwrap().result, "3");
    }

    #[tokio::test]
    async fn captures_into_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(dir.path(), "ab.sdf.gz", &[record("A", "5"), record("B", "7")]);
        let path = dir.path().join("reference.csv");

        {
            let mut store = CsvResultStore::open(&path).unwrap();
            driver().capture(&archive, body_consumer(), &mut store).await.unwrap();
        }

        let reference = CsvResultStore::open_read_only(&path).unwrap();
        assert_eq!(reference.len(), 2);
        assert_eq!(reference.lookup("B").unwrap().unwrap().result, "7");
    }

    #[tokio::test]
    async fn duplicate_identifier_aborts_capture() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(
            dir.path(),
            "dup.sdf.gz",
            &[record("A", "5"), record("A", "6"), record("B", "7")],
        );
        let mut store = MemoryResultStore::new();

        let err = driver()
            .capture(&archive, body_consumer(), &mut store)
            .await
            .unwrap_err();

        assert!(matches!(err, DriverError::DuplicateIdentifier(id) if id == "A"));
        // Rolled back: nothing of the aborted capture is kept
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn consumer_fault_aborts_capture() {
        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(dir.path(), "abc.sdf.gz", &[record("A", "5"), record("B", "7")]);
        let consumer = Arc::new(from_fn(|record| {
            if first_token(record) == "B" {
                return Err("unsupported query atom".into());
            }
            Ok(ConsumerResult::new(first_token(record), "", ""))
        }));
        let mut store = MemoryResultStore::new();

        let err = driver().capture(&archive, consumer, &mut store).await.unwrap_err();

        assert!(matches!(
            err,
            DriverError::Pipeline(PipelineError::ConsumerException { .. })
        ));
    }

    #[tokio::test]
    async fn missing_archive_aborts_capture() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryResultStore::new();

        let err = driver()
            .capture(dir.path().join("absent.sdf.gz"), body_consumer(), &mut store)
            .await
            .unwrap_err();

        assert!(matches!(err, DriverError::Pipeline(PipelineError::Archive { .. })));
    }

    #[tokio::test]
    async fn aborted_capture_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<String> = (0..50).map(|i| record(&format!("ID{i}"), "x")).collect();
        let archive = write_archive(dir.path(), "ids.sdf.gz", &records);
        let path = dir.path().join("reference.csv");
        let single = Driver::new(Pipeline::new(PipelineConfig::new().with_workers(1)), SilentReporter);
        let failing = Arc::new(from_fn(|record| {
            if first_token(record) == "ID40" {
                return Err("unsupported query atom".into());
            }
            Ok(ConsumerResult::new(first_token(record), "regression", "x"))
        }));

        {
            let mut store = CsvResultStore::open(&path).unwrap();
            single.capture(&archive, failing, &mut store).await.unwrap_err();
            assert!(store.is_empty());
        }
        assert!(!path.exists());

        let mut store = CsvResultStore::open(&path).unwrap();
        let verdict = single.capture(&archive, body_consumer(), &mut store).await.unwrap();

        assert_eq!(verdict, Verdict::Passed);
        drop(store);
        assert_eq!(CsvResultStore::open_read_only(&path).unwrap().len(), 50);
    }

    #[tokio::test]
    async fn aborted_capture_keeps_earlier_reference_rows() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_archive(dir.path(), "ab.sdf.gz", &[record("A", "5"), record("B", "7")]);
        let second = write_archive(dir.path(), "cc.sdf.gz", &[record("C", "3"), record("C", "3")]);
        let mut store = MemoryResultStore::new();

        driver().capture(&first, body_consumer(), &mut store).await.unwrap();
        let err = driver()
            .capture(&second, body_consumer(), &mut store)
            .await
            .unwrap_err();

        assert!(matches!(err, DriverError::DuplicateIdentifier(id) if id == "C"));
        assert_eq!(store.len(), 2);
        assert!(store.lookup("C").unwrap().is_none());
    }
}
