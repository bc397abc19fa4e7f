//! Export of the session's records.
//!
//! CSV output uses the same format the importer reads, so an exported file
//! can be imported again in a later session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Record;

/// Header written at the top of CSV exports.
pub const CSV_HEADER: &str = "Test,Date,Result";

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Record {index} has a test name that cannot be written as CSV: '{test}'")]
    Unrepresentable { index: usize, test: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// JSON export envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordExport {
    /// Export format version
    pub format_version: String,
    /// Export timestamp
    pub exported_at: String,
    /// Number of records
    pub record_count: usize,
    /// Records in store order
    pub records: Vec<Record>,
}

/// Export records as importable CSV.
///
/// The importer does not support quoting, so a test name containing a
/// comma or line break is refused rather than written ambiguously.
pub fn to_csv(records: &[Record]) -> ExportResult<String> {
    let mut csv = String::new();

    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for (index, record) in records.iter().enumerate() {
        if record.test.contains([',', '\n', '\r']) {
            return Err(ExportError::Unrepresentable {
                index,
                test: record.test.clone(),
            });
        }
        csv.push_str(&format!(
            "{},{},{}\n",
            record.test,
            record.display_date(),
            record.result
        ));
    }

    Ok(csv)
}

/// Export records as pretty-printed JSON.
pub fn to_json(records: &[Record]) -> ExportResult<String> {
    let export = RecordExport {
        format_version: "1.0".to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        record_count: records.len(),
        records: records.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&export)?)
}
