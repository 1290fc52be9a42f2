use std::collections::HashSet;

use super::error::StorageError;
use crate::consumer::ConsumerResult;

/// Keyed store of consumer results with the identifier as unique key
///
/// Owned and mutated by a single driver; implementations only need per-call
/// consistency.
pub trait ResultStore: Send {
    /// Prepare the backing storage; a no-op if it already exists
    fn create_if_absent(&mut self) -> Result<(), StorageError>;

    /// Add a result, failing with `DuplicateIdentifier` if the identifier is
    /// already stored
    fn insert(&mut self, result: ConsumerResult) -> Result<(), StorageError>;

    /// Add a result, replacing any previous result for the identifier
    fn upsert(&mut self, result: ConsumerResult) -> Result<(), StorageError>;

    /// Point lookup by identifier
    fn lookup(&self, identifier: &str) -> Result<Option<ConsumerResult>, StorageError>;

    /// All stored identifiers
    fn identifiers(&self) -> Result<HashSet<String>, StorageError>;

    /// Number of stored identifiers
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every write so far durable
    ///
    /// Flushed writes survive a later [`ResultStore::rollback`].
    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Discard every write since the store was opened or last flushed
    fn rollback(&mut self) -> Result<(), StorageError>;
}
