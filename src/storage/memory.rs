use std::collections::HashSet;

use dashmap::{DashMap, Entry};

use super::error::StorageError;
use super::traits::ResultStore;
use crate::consumer::ConsumerResult;

/// Ephemeral in-memory result store using DashMap
pub struct MemoryResultStore {
    results: DashMap<String, ConsumerResult>,
    /// Previous value of every key written since the last flush
    journal: Vec<(String, Option<ConsumerResult>)>,
}

impl MemoryResultStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            results: DashMap::new(),
            journal: Vec::new(),
        }
    }
}

impl Default for MemoryResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore for MemoryResultStore {
    fn create_if_absent(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn insert(&mut self, result: ConsumerResult) -> Result<(), StorageError> {
        match self.results.entry(result.identifier.clone()) {
            Entry::Occupied(e) => Err(StorageError::DuplicateIdentifier(e.key().clone())),
            Entry::Vacant(e) => {
                self.journal.push((e.key().clone(), None));
                e.insert(result);
                Ok(())
            }
        }
    }

    fn upsert(&mut self, result: ConsumerResult) -> Result<(), StorageError> {
        let identifier = result.identifier.clone();
        let previous = self.results.insert(identifier.clone(), result);
        self.journal.push((identifier, previous));
        Ok(())
    }

    fn lookup(&self, identifier: &str) -> Result<Option<ConsumerResult>, StorageError> {
        Ok(self.results.get(identifier).map(|r| r.value().clone()))
    }

    fn identifiers(&self) -> Result<HashSet<String>, StorageError> {
        Ok(self.results.iter().map(|r| r.key().clone()).collect())
    }

    fn len(&self) -> usize {
        self.results.len()
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.journal.clear();
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        for (identifier, previous) in self.journal.drain(..).rev() {
            match previous {
                Some(result) => {
                    self.results.insert(identifier, result);
                }
                None => {
                    self.results.remove(&identifier);
                }
            }
        }
        Ok(())
    }
}
