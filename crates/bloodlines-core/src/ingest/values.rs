//! Field-level value parsing shared by CSV import and record edits.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{Record, DATE_FORMAT};

/// A single field value that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Test name must not be empty.")]
    EmptyTest,

    #[error("Invalid number format in Result column: '{0}'.")]
    InvalidResult(String),

    #[error("Invalid date format in Date column: '{0}' (expected DD/MM/YYYY).")]
    InvalidDate(String),
}

/// Parse a Result field into a finite number.
pub fn parse_result(raw: &str) -> Result<f64, ValueError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValueError::InvalidResult(trimmed.to_string())),
    }
}

/// Parse a `DD/MM/YYYY` Date field.
///
/// Day and month must be exactly two digits and the year exactly four.
/// Impossible dates such as `31/04/2023` or `29/02/2023` are rejected
/// rather than rolled over into the next month.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValueError> {
    let trimmed = raw.trim();
    let invalid = || ValueError::InvalidDate(trimmed.to_string());

    let parts: Vec<&str> = trimmed.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(invalid());
    };

    let widths_ok = day.len() == 2 && month.len() == 2 && year.len() == 4;
    let digits_ok = [day, month, year]
        .iter()
        .all(|part| part.bytes().all(|b| b.is_ascii_digit()));
    if !widths_ok || !digits_ok {
        return Err(invalid());
    }

    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    // Composed date must read back as the same day/month/year
    if date.day() != day || date.month() != month || date.year() != year {
        return Err(invalid());
    }

    Ok(date)
}

/// Render a stored date as `DD/MM/YYYY`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Build a record from raw user-entered strings using the import rules.
///
/// Used for edits, so a hand-edited row can never hold a value the CSV
/// parser would have refused.
pub fn parse_record(test: &str, date: &str, result: &str) -> Result<Record, ValueError> {
    let test = test.trim();
    if test.is_empty() {
        return Err(ValueError::EmptyTest);
    }
    let result = parse_result(result)?;
    let date = parse_date(date)?;
    Ok(Record::new(test, date, result))
}
