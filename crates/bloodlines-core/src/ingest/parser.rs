//! CSV parser: header slots, row decisions, and the parse report.

use serde::{Deserialize, Serialize};

use super::values::{parse_date, parse_result};
use super::{ParseError, ParseResult};
use crate::config::RowErrorPolicy;
use crate::models::Record;

/// Required header names, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Test", "Date", "Result"];

const UTF8_BOM: char = '\u{feff}';

/// Column positions of the required fields, resolved once from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Index of the `Test` column
    pub test: usize,
    /// Index of the `Date` column
    pub date: usize,
    /// Index of the `Result` column
    pub result: usize,
    /// Total number of header fields
    pub width: usize,
}

/// Why a data row was left out of the import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SkipReason {
    /// Field count differs from the header
    ColumnCount { expected: usize, found: usize },
    /// Test, Date or Result is empty
    MissingValue,
    /// Result is not a finite number (only under [`RowErrorPolicy::Skip`])
    InvalidResult { value: String },
    /// Date is not a real `DD/MM/YYYY` date (only under [`RowErrorPolicy::Skip`])
    InvalidDate { value: String },
}

/// A data row that was skipped, with its 1-based line number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: SkipReason,
}

/// Outcome of a successful parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParseReport {
    /// Parsed records, in file order
    pub records: Vec<Record>,
    /// Rows that were not imported
    pub skipped: Vec<SkippedRow>,
}

impl ParseReport {
    /// Number of rows dropped for a field-count mismatch.
    pub fn column_mismatches(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::ColumnCount { .. }))
            .count()
    }
}

impl Header {
    /// Resolve required columns from the header line.
    ///
    /// Names are trimmed and matched case-sensitively. When a name repeats,
    /// its last occurrence wins.
    pub fn parse(line: &str) -> ParseResult<Self> {
        let names: Vec<&str> = line
            .trim_start_matches(UTF8_BOM)
            .split(',')
            .map(str::trim)
            .collect();
        let position = |wanted: &str| names.iter().rposition(|name| *name == wanted);

        let slots: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|&c| position(c)).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(name, _)| name.to_string())
            .collect();

        match slots.as_slice() {
            [Some(test), Some(date), Some(result)] => Ok(Self {
                test: *test,
                date: *date,
                result: *result,
                width: names.len(),
            }),
            _ => Err(ParseError::MissingColumns { missing }),
        }
    }

    /// Turn one data line into a record, or explain why it was skipped.
    pub fn read_row(&self, line: &str) -> Result<Record, SkipReason> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != self.width {
            return Err(SkipReason::ColumnCount {
                expected: self.width,
                found: fields.len(),
            });
        }

        let (test, date, result) = (fields[self.test], fields[self.date], fields[self.result]);
        if test.is_empty() || date.is_empty() || result.is_empty() {
            return Err(SkipReason::MissingValue);
        }

        let result = parse_result(result).map_err(|_| SkipReason::InvalidResult {
            value: result.to_string(),
        })?;
        let date = parse_date(date).map_err(|_| SkipReason::InvalidDate {
            value: date.to_string(),
        })?;

        Ok(Record::new(test, date, result))
    }
}

/// Parse CSV text into records, aborting on any unparseable value.
pub fn parse(text: &str) -> ParseResult<Vec<Record>> {
    parse_with(text, RowErrorPolicy::Abort).map(|report| report.records)
}

/// Parse CSV text into a report under the given row error policy.
pub fn parse_with(text: &str, policy: RowErrorPolicy) -> ParseResult<ParseReport> {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < 2 {
        return Err(ParseError::EmptyOrHeaderOnly);
    }

    let header = Header::parse(lines[0])?;
    let mut report = ParseReport::default();

    for (index, line) in lines.iter().enumerate().skip(1) {
        let line_number = index + 1;

        if line.trim().is_empty() {
            continue;
        }

        match header.read_row(line) {
            Ok(record) => report.records.push(record),
            Err(SkipReason::InvalidResult { value }) if policy == RowErrorPolicy::Abort => {
                return Err(ParseError::InvalidResult {
                    line: line_number,
                    value,
                });
            }
            Err(SkipReason::InvalidDate { value }) if policy == RowErrorPolicy::Abort => {
                return Err(ParseError::InvalidDate {
                    line: line_number,
                    value,
                });
            }
            Err(reason) => {
                tracing::debug!(line = line_number, reason = ?reason, "Skipping CSV row");
                report.skipped.push(SkippedRow {
                    line: line_number,
                    reason,
                });
            }
        }
    }

    tracing::debug!(
        parsed = report.records.len(),
        skipped = report.skipped.len(),
        "Parsed CSV"
    );

    Ok(report)
}
