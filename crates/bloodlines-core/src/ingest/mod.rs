//! CSV ingestion for spreadsheet exports of blood-test results.
//!
//! Pipeline: raw text → header slots → per-row decision (record, skip, or
//! abort) → [`ParseReport`]
//!
//! Format: comma-separated, `\n`-delimited, first line is a header that
//! must name `Test`, `Date` and `Result` (any order, extra columns
//! ignored). Dates are `DD/MM/YYYY`. No quoting is supported.

mod parser;
mod values;

pub use parser::*;
pub use values::*;

use thiserror::Error;

/// Errors that abort an import. The store is never touched when one occurs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("CSV file is empty or has only headers.")]
    EmptyOrHeaderOnly,

    #[error("CSV file must contain 'Test', 'Date', and 'Result' columns (missing: {}).", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Invalid number format in Result column on line {line}: '{value}'.")]
    InvalidResult { line: usize, value: String },

    #[error("Invalid date format in Date column on line {line}: '{value}' (expected DD/MM/YYYY).")]
    InvalidDate { line: usize, value: String },
}

pub type ParseResult<T> = Result<T, ParseError>;
