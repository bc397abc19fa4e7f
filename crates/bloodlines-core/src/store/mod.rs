//! Session record store.
//!
//! An ordered, in-memory collection of [`Record`]s. Insertion order is the
//! display order. `(test, date)` uniqueness is enforced when batches are
//! merged in, not on direct edits.

mod merge;

pub use merge::*;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Record;

/// Store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Index {index} is out of range for a store of {len} records")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered record collection for one browsing session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given records as-is.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in store order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Get a record by index.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Append a batch to the end, preserving its order.
    pub fn append(&mut self, batch: Vec<Record>) {
        self.records.extend(batch);
    }

    /// Merge a batch in, dropping duplicates, and append what remains.
    ///
    /// Returns the merge outcome; `accepted` holds what was appended.
    pub fn merge_batch(&mut self, incoming: Vec<Record>, scope: DedupScope) -> MergeResult {
        let merged = merge_with(&self.records, incoming, scope);
        self.records.extend(merged.accepted.iter().cloned());
        merged
    }

    /// Replace the record at `index`, returning the previous one.
    ///
    /// The new record is not re-validated and may collide with another
    /// record's key.
    pub fn replace_at(&mut self, index: usize, record: Record) -> StoreResult<Record> {
        let len = self.records.len();
        let slot = self
            .records
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, record))
    }

    /// Remove the record at `index`.
    pub fn remove_at(&mut self, index: usize) -> StoreResult<Record> {
        self.check_index(index)?;
        Ok(self.records.remove(index))
    }

    /// Remove every record whose index is in `indices`.
    ///
    /// All indices are validated before anything is removed, and removal is
    /// a single filtering pass so earlier removals never shift later
    /// indices. Repeated indices count once. Returns the removed records in
    /// store order.
    pub fn remove_many<I>(&mut self, indices: I) -> StoreResult<Vec<Record>>
    where
        I: IntoIterator<Item = usize>,
    {
        let targets: HashSet<usize> = indices.into_iter().collect();
        for &index in &targets {
            self.check_index(index)?;
        }

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .enumerate()
            .partition(|(index, _)| targets.contains(index));

        self.records = kept.into_iter().map(|(_, record)| record).collect();
        Ok(removed.into_iter().map(|(_, record)| record).collect())
    }

    /// Records for one test, in store order.
    pub fn select_by_test(&self, test: &str) -> Vec<&Record> {
        self.records.iter().filter(|r| r.test == test).collect()
    }

    /// Records belonging to any of the given tests, in store order.
    pub fn select_by_category<S: AsRef<str>>(&self, tests: &[S]) -> Vec<&Record> {
        let names: HashSet<&str> = tests.iter().map(AsRef::as_ref).collect();
        self.records
            .iter()
            .filter(|r| names.contains(r.test.as_str()))
            .collect()
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn check_index(&self, index: usize) -> StoreResult<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }
}
