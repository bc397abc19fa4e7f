//! Blood-test result records.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Display format for record dates (day/month/year).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// A single blood-test measurement.
///
/// The natural key is `(test, date)`; see [`RecordKey`]. Whether the result
/// falls inside the clinical reference range is not stored here, it is
/// derived at display time from the matching [`RangeSpec`](super::RangeSpec).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Test name (e.g., "HbA1c", "Urate")
    pub test: String,
    /// Sample date, normalized to UTC midnight
    pub date: DateTime<Utc>,
    /// Measured value (always finite)
    pub result: f64,
}

/// Identity of a record within a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub test: String,
    pub date: DateTime<Utc>,
}

impl Record {
    /// Create a record for a calendar date.
    pub fn new(test: impl Into<String>, date: NaiveDate, result: f64) -> Self {
        Self {
            test: test.into(),
            date: utc_midnight(date),
            result,
        }
    }

    /// The `(test, date)` key used for deduplication.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            test: self.test.clone(),
            date: self.date,
        }
    }

    /// Calendar date of the sample.
    pub fn calendar_date(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Date rendered as `DD/MM/YYYY`.
    pub fn display_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Anchor a calendar date at midnight UTC.
pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
