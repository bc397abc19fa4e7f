//! Property tests for parsing, merging and record removal.

use bloodlines_core::ingest::{format_date, parse, parse_date};
use bloodlines_core::store::{merge, merge_with, DedupScope, RecordStore};
use bloodlines_core::Record;
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use std::collections::HashSet;

const TESTS: [&str; 4] = ["HbA1c", "Urate", "Urea", "Sodium"];

fn any_date() -> impl Strategy<Value = NaiveDate> {
    // 1900-01-01 through roughly 2099
    (0i64..73_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + Duration::days(offset)
    })
}

/// Records drawn from a small key space so duplicates are common.
fn colliding_record() -> impl Strategy<Value = Record> {
    (0usize..TESTS.len(), 1u32..=10, -500i32..500).prop_map(|(t, day, result)| {
        Record::new(
            TESTS[t],
            NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            result as f64 / 4.0,
        )
    })
}

fn records(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(colliding_record(), 0..max)
}

fn csv_line(record: &Record) -> String {
    format!("{},{},{}", record.test, record.display_date(), record.result)
}

proptest! {
    #[test]
    fn date_roundtrips_through_display_format(date in any_date()) {
        let text = date.format("%d/%m/%Y").to_string();
        let parsed = parse_date(&text).unwrap();
        prop_assert_eq!(parsed, date);

        let record = Record::new("Urea", parsed, 1.0);
        prop_assert_eq!(format_date(&record.date), text);
    }

    #[test]
    fn mismatched_rows_are_the_only_ones_dropped(
        rows in prop::collection::vec((colliding_record(), 0u8..3), 1..40)
    ) {
        let mut text = String::from("Test,Date,Result\n");
        let mut expected = Vec::new();

        for (record, shape) in &rows {
            match shape {
                0 => {
                    text.push_str(&csv_line(record));
                    expected.push(record.clone());
                }
                1 => text.push_str(&format!("{},{}", record.test, record.display_date())),
                _ => text.push_str(&format!("{},extra", csv_line(record))),
            }
            text.push('\n');
        }

        let parsed = parse(&text).unwrap();
        prop_assert_eq!(parsed, expected);
    }

    #[test]
    fn merge_is_idempotent(existing in records(30), incoming in records(30)) {
        let first = merge(&existing, incoming.clone());

        let mut combined = existing.clone();
        combined.extend(first.accepted);

        let again = merge(&combined, incoming);
        prop_assert!(again.accepted.is_empty());

        let self_merge = merge(&existing, existing.clone());
        prop_assert!(merge(&existing, self_merge.accepted).accepted.is_empty());
    }

    #[test]
    fn merge_preserves_incoming_order(existing in records(20), incoming in records(30)) {
        let existing_keys: HashSet<_> = existing.iter().map(Record::key).collect();

        let mut seen = existing_keys.clone();
        let expected: Vec<Record> = incoming
            .iter()
            .filter(|r| seen.insert(r.key()))
            .cloned()
            .collect();

        let merged = merge(&existing, incoming.clone());
        prop_assert_eq!(merged.duplicate_count, incoming.len() - expected.len());
        prop_assert_eq!(merged.accepted, expected);

        let expected_existing_only: Vec<Record> = incoming
            .iter()
            .filter(|r| !existing_keys.contains(&r.key()))
            .cloned()
            .collect();
        let merged = merge_with(&existing, incoming, DedupScope::ExistingOnly);
        prop_assert_eq!(merged.accepted, expected_existing_only);
    }

    #[test]
    fn merged_store_has_unique_keys(batches in prop::collection::vec(records(20), 1..5)) {
        let mut store = RecordStore::new();
        for batch in batches {
            store.merge_batch(batch, DedupScope::ExistingAndBatch);
        }

        let keys: HashSet<_> = store.records().iter().map(Record::key).collect();
        prop_assert_eq!(keys.len(), store.len());
    }

    #[test]
    fn remove_many_drops_exactly_the_selected(
        (records, mask) in records(40).prop_flat_map(|records| {
            let len = records.len();
            (Just(records), prop::collection::vec(any::<bool>(), len))
        })
    ) {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, &remove)| remove)
            .map(|(i, _)| i)
            .collect();
        let expected: Vec<Record> = records
            .iter()
            .zip(&mask)
            .filter(|(_, &remove)| !remove)
            .map(|(r, _)| r.clone())
            .collect();

        let mut store = RecordStore::from_records(records.clone());
        let removed = store.remove_many(indices.clone()).unwrap();

        prop_assert_eq!(store.len(), records.len() - indices.len());
        prop_assert_eq!(removed.len(), indices.len());
        prop_assert_eq!(store.records(), expected.as_slice());
    }
}
