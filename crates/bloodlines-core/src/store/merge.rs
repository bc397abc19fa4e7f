//! Deduplicating merge of an incoming batch into existing records.
//!
//! A record is a duplicate when its `(test, date)` key is already present.
//! Duplicates are dropped, never overwritten.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Record, RecordKey};

/// Which keys an incoming record is checked against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DedupScope {
    /// Only records already in the store
    ExistingOnly,
    /// Records already in the store and earlier records of the same batch
    ExistingAndBatch,
}

impl DedupScope {
    pub fn from_flag(dedup_within_batch: bool) -> Self {
        if dedup_within_batch {
            Self::ExistingAndBatch
        } else {
            Self::ExistingOnly
        }
    }
}

/// Outcome of a merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MergeResult {
    /// Incoming records to append, in their original relative order
    pub accepted: Vec<Record>,
    /// Number of incoming records dropped as duplicates
    pub duplicate_count: usize,
}

/// Merge with within-batch deduplication.
pub fn merge(existing: &[Record], incoming: Vec<Record>) -> MergeResult {
    merge_with(existing, incoming, DedupScope::ExistingAndBatch)
}

/// Merge with an explicit dedup scope.
pub fn merge_with(existing: &[Record], incoming: Vec<Record>, scope: DedupScope) -> MergeResult {
    let mut seen: HashSet<RecordKey> = existing.iter().map(Record::key).collect();
    let mut result = MergeResult::default();

    for record in incoming {
        let key = record.key();
        if seen.contains(&key) {
            result.duplicate_count += 1;
            continue;
        }
        if scope == DedupScope::ExistingAndBatch {
            seen.insert(key);
        }
        result.accepted.push(record);
    }

    result
}
