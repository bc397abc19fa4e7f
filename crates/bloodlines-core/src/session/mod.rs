//! Application state for one browsing session.
//!
//! [`Session`] owns the record store and the navigation state that the
//! sidebar and main panel render from. Every mutation goes through it, and
//! a failed operation leaves it exactly as it was.

mod notify;

pub use notify::*;

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::export::{self, ExportError};
use crate::ingest::{self, ParseError, SkippedRow, ValueError};
use crate::models::Record;
use crate::reference::{RangeTable, TestCatalog};
use crate::store::{DedupScope, RecordStore, StoreError};
use crate::view::{ChartSeries, Projection, TableRow};

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Failed to read the file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("File is {size} bytes, above the {limit} byte import limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Unknown test category: {0}")]
    UnknownCategory(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Notification describing this failure.
    pub fn notification(&self) -> Notification {
        match self {
            SessionError::Parse(e) => Notification::error("CSV Parsing Error", e.to_string()),
            SessionError::FileRead(_) => Notification::error("Error", "Failed to read the file."),
            other => Notification::error("Error", other.to_string()),
        }
    }
}

/// What the main panel shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum View {
    /// Nothing selected yet
    #[default]
    Welcome,
    /// Chart for one test
    Test(String),
    /// Charts for every test of a category
    Category(String),
    /// Uploader and data table
    DataManagement,
}

/// A test name in an import that has no reference range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnknownTest {
    pub test: String,
    /// Closest known test name, if any
    pub suggestion: Option<String>,
}

/// Summary of a successful import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportOutcome {
    /// Records parsed from the file
    pub parsed: usize,
    /// Rows left out by the parser
    pub skipped: Vec<SkippedRow>,
    /// Records appended to the store
    pub accepted: usize,
    /// Records dropped as duplicates
    pub duplicates: usize,
    /// Accepted test names without a reference range
    pub unknown_tests: Vec<UnknownTest>,
    /// Messages for the notification surface
    pub notifications: Vec<Notification>,
}

/// Session state.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    ranges: RangeTable,
    store: RecordStore,
    view: View,
    expanded: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Start an empty session.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_ranges(config, RangeTable::standard().clone())
    }

    /// Start an empty session with a custom range table.
    pub fn with_ranges(config: SessionConfig, ranges: RangeTable) -> Self {
        Self {
            config,
            ranges,
            store: RecordStore::new(),
            view: View::Welcome,
            expanded: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn ranges(&self) -> &RangeTable {
        &self.ranges
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn records(&self) -> &[Record] {
        self.store.records()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Show the chart for a test.
    pub fn select_test(&mut self, test: &str) {
        self.view = View::Test(test.to_string());
    }

    /// Show the charts for a category.
    pub fn select_category(&mut self, category: &str) -> SessionResult<()> {
        if TestCatalog::standard().category(category).is_none() {
            return Err(SessionError::UnknownCategory(category.to_string()));
        }
        self.view = View::Category(category.to_string());
        Ok(())
    }

    /// Show the uploader and data table.
    pub fn open_data_management(&mut self) {
        self.view = View::DataManagement;
    }

    /// Expand or collapse a sidebar category. Returns whether it is now expanded.
    pub fn toggle_category(&mut self, category: &str) -> bool {
        if let Some(pos) = self.expanded.iter().position(|c| c == category) {
            self.expanded.remove(pos);
            false
        } else {
            self.expanded.push(category.to_string());
            true
        }
    }

    pub fn is_expanded(&self, category: &str) -> bool {
        self.expanded.iter().any(|c| c == category)
    }

    /// Expanded categories, in the order they were opened.
    pub fn expanded_categories(&self) -> &[String] {
        &self.expanded
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Parse CSV text and merge it into the store.
    ///
    /// Either the whole batch is merged or, on error, nothing is.
    pub fn import_csv(&mut self, text: &str) -> SessionResult<ImportOutcome> {
        let report = match ingest::parse_with(text, self.config.row_error_policy) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "CSV import rejected");
                return Err(e.into());
            }
        };

        let parsed = report.records.len();
        let scope = DedupScope::from_flag(self.config.dedup_within_batch);
        let merged = self.store.merge_batch(report.records, scope);
        let unknown_tests = self.unknown_tests(&merged.accepted);

        if merged.duplicate_count > 0 {
            tracing::warn!(duplicates = merged.duplicate_count, "Dropped duplicate records");
        }
        tracing::info!(
            parsed,
            skipped = report.skipped.len(),
            accepted = merged.accepted.len(),
            duplicates = merged.duplicate_count,
            "Imported CSV"
        );

        let mut notifications = Vec::new();
        if merged.duplicate_count > 0 {
            notifications.push(Notification::warning(
                "Warning",
                "Some records were not uploaded as they are duplicates of existing data.",
            ));
        }
        if !report.skipped.is_empty() {
            notifications.push(Notification::warning(
                "Warning",
                format!("{} rows were skipped.", report.skipped.len()),
            ));
        }
        if !unknown_tests.is_empty() {
            let names: Vec<&str> = unknown_tests.iter().map(|u| u.test.as_str()).collect();
            notifications.push(Notification::warning(
                "Warning",
                format!("No reference range for: {}.", names.join(", ")),
            ));
        }
        notifications.push(Notification::info(
            "Success",
            format!(
                "CSV data uploaded and parsed successfully! {} new records uploaded.",
                merged.accepted.len()
            ),
        ));

        Ok(ImportOutcome {
            parsed,
            skipped: report.skipped,
            accepted: merged.accepted.len(),
            duplicates: merged.duplicate_count,
            unknown_tests,
            notifications,
        })
    }

    /// Read a CSV file and import it.
    pub fn import_file<P: AsRef<Path>>(&mut self, path: P) -> SessionResult<ImportOutcome> {
        let text = read_import_file(path.as_ref(), self.config.max_import_bytes)?;
        self.import_csv(&text)
    }

    fn unknown_tests(&self, records: &[Record]) -> Vec<UnknownTest> {
        let names: BTreeSet<&str> = records
            .iter()
            .map(|r| r.test.as_str())
            .filter(|test| self.ranges.lookup(test).is_none())
            .collect();

        names
            .into_iter()
            .map(|test| UnknownTest {
                test: test.to_string(),
                suggestion: self.ranges.suggest(test).map(str::to_string),
            })
            .collect()
    }

    // =========================================================================
    // Edit / delete
    // =========================================================================

    /// Replace a record from raw table inputs, returning the old record.
    ///
    /// Inputs go through the same value rules as CSV import.
    pub fn edit_record(
        &mut self,
        index: usize,
        test: &str,
        date: &str,
        result: &str,
    ) -> SessionResult<Record> {
        let record = ingest::parse_record(test, date, result)?;
        let old = self.store.replace_at(index, record)?;
        tracing::info!(index, test = %old.test, "Edited record");
        Ok(old)
    }

    /// Delete one record.
    pub fn delete_record(&mut self, index: usize) -> SessionResult<Record> {
        let removed = self.store.remove_at(index)?;
        tracing::info!(index, test = %removed.test, "Deleted record");
        Ok(removed)
    }

    /// Delete several records at once.
    pub fn delete_records<I>(&mut self, indices: I) -> SessionResult<Vec<Record>>
    where
        I: IntoIterator<Item = usize>,
    {
        let removed = self.store.remove_many(indices)?;
        tracing::info!(count = removed.len(), "Deleted records");
        Ok(removed)
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    // =========================================================================
    // Projections and export
    // =========================================================================

    fn projection(&self) -> Projection<'_> {
        Projection::with_ranges(&self.store, &self.ranges)
    }

    /// Chart data for one test.
    pub fn chart(&self, test: &str) -> ChartSeries {
        self.projection().chart(test)
    }

    /// Chart data for each test of a category.
    pub fn category_charts(&self, category: &str) -> SessionResult<Vec<ChartSeries>> {
        let category = TestCatalog::standard()
            .category(category)
            .ok_or_else(|| SessionError::UnknownCategory(category.to_string()))?;
        Ok(self.projection().category_charts(category))
    }

    /// Charts for whatever the current view shows.
    pub fn current_charts(&self) -> SessionResult<Vec<ChartSeries>> {
        match &self.view {
            View::Test(test) => Ok(vec![self.chart(test)]),
            View::Category(category) => self.category_charts(category),
            View::Welcome | View::DataManagement => Ok(Vec::new()),
        }
    }

    /// Data table rows for every record.
    pub fn table(&self) -> Vec<TableRow> {
        self.projection().table()
    }

    pub fn export_csv(&self) -> SessionResult<String> {
        Ok(export::to_csv(self.store.records())?)
    }

    pub fn export_json(&self) -> SessionResult<String> {
        Ok(export::to_json(self.store.records())?)
    }
}

/// Read an import file, refusing anything above `limit` bytes.
///
/// Bytes that are not valid UTF-8 (a `µ` from a Windows-1252 spreadsheet
/// export, say) become U+FFFD instead of failing the whole import.
pub fn read_import_file(path: &Path, limit: u64) -> SessionResult<String> {
    let size = std::fs::metadata(path)?.len();
    if size > limit {
        return Err(SessionError::FileTooLarge { size, limit });
    }
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RowErrorPolicy;
    use std::io::Write;

    const CSV: &str = "Test,Date,Result\nHbA1c,01/03/2023,42\nUrate,01/03/2023,388\nHbA1c,01/06/2023,39\n";

    #[test]
    fn test_import_into_empty_session() {
        let mut session = Session::default();
        let outcome = session.import_csv(CSV).unwrap();

        assert_eq!(outcome.parsed, 3);
        assert_eq!(outcome.accepted, 3);
        assert_eq!(outcome.duplicates, 0);
        assert_eq!(session.records().len(), 3);
        assert_eq!(
            outcome.notifications,
            vec![Notification::info(
                "Success",
                "CSV data uploaded and parsed successfully! 3 new records uploaded."
            )]
        );
    }

    #[test]
    fn test_reimport_warns_about_duplicates() {
        let mut session = Session::default();
        session.import_csv(CSV).unwrap();
        let outcome = session.import_csv(CSV).unwrap();

        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.duplicates, 3);
        assert_eq!(session.records().len(), 3);
        assert_eq!(outcome.notifications[0].severity, Severity::Warning);
        assert!(outcome.notifications[0].message.contains("duplicates"));
        assert!(outcome.notifications[1].message.contains("0 new records"));
    }

    #[test]
    fn test_failed_import_leaves_store_unchanged() {
        let mut session = Session::default();
        session.import_csv(CSV).unwrap();
        let before = session.store().clone();

        let err = session
            .import_csv("Test,Date,Result\nUrea,02/02/2023,5\nUrea,31/02/2023,5")
            .unwrap_err();
        assert!(matches!(err, SessionError::Parse(ParseError::InvalidDate { line: 3, .. })));
        assert_eq!(session.store(), &before);

        let note = err.notification();
        assert_eq!(note.severity, Severity::Error);
        assert_eq!(note.title, "CSV Parsing Error");
    }

    #[test]
    fn test_skip_policy_reports_rows() {
        let config = SessionConfig {
            row_error_policy: RowErrorPolicy::Skip,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config);
        let outcome = session
            .import_csv("Test,Date,Result\nUrea,02/02/2023,5\nUrea,31/02/2023,5")
            .unwrap();

        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome
            .notifications
            .iter()
            .any(|n| n.message == "1 rows were skipped."));
    }

    #[test]
    fn test_unknown_tests_reported_with_suggestion() {
        let mut session = Session::default();
        let outcome = session
            .import_csv("Test,Date,Result\nTrigliceride,02/02/2023,1.2\nVitamin D,02/02/2023,60")
            .unwrap();

        assert_eq!(
            outcome.unknown_tests,
            vec![
                UnknownTest {
                    test: "Trigliceride".into(),
                    suggestion: Some("Triglyceride".into())
                },
                UnknownTest {
                    test: "Vitamin D".into(),
                    suggestion: None
                },
            ]
        );
        assert_eq!(session.records().len(), 2);
    }

    #[test]
    fn test_edit_record_reparses_inputs() {
        let mut session = Session::default();
        session.import_csv(CSV).unwrap();

        let old = session.edit_record(1, "Urate", "02/03/2023", "401.5").unwrap();
        assert_eq!(old.result, 388.0);
        assert_eq!(session.records()[1].result, 401.5);
        assert_eq!(session.records()[1].display_date(), "02/03/2023");

        let before = session.store().clone();
        assert!(matches!(
            session.edit_record(1, "Urate", "30/02/2023", "401.5"),
            Err(SessionError::Value(ValueError::InvalidDate(_)))
        ));
        assert!(matches!(
            session.edit_record(9, "Urate", "02/03/2023", "401.5"),
            Err(SessionError::Store(StoreError::IndexOutOfRange { index: 9, len: 3 }))
        ));
        assert_eq!(session.store(), &before);
    }

    #[test]
    fn test_delete_records() {
        let mut session = Session::default();
        session.import_csv(CSV).unwrap();

        let removed = session.delete_records([0, 2]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].test, "Urate");

        assert!(session.delete_record(1).is_err());
        session.delete_record(0).unwrap();
        assert!(session.records().is_empty());
    }

    #[test]
    fn test_navigation() {
        let mut session = Session::default();
        assert_eq!(session.view(), &View::Welcome);

        session.select_test("Urate");
        assert_eq!(session.view(), &View::Test("Urate".into()));

        session.open_data_management();
        assert_eq!(session.view(), &View::DataManagement);
        assert!(session.current_charts().unwrap().is_empty());

        assert!(session.select_category("Bones").is_err());
        assert_eq!(session.view(), &View::DataManagement);
        session.select_category("Liver").unwrap();
        assert_eq!(session.current_charts().unwrap().len(), 6);
    }

    #[test]
    fn test_toggle_category() {
        let mut session = Session::default();
        assert!(session.toggle_category("Kidney"));
        assert!(session.toggle_category("Liver"));
        assert!(session.is_expanded("Kidney"));
        assert!(!session.toggle_category("Kidney"));
        assert!(!session.is_expanded("Kidney"));
        assert_eq!(session.expanded_categories(), &["Liver".to_string()]);
    }

    #[test]
    fn test_current_chart_for_selected_test() {
        let mut session = Session::default();
        session.import_csv(CSV).unwrap();
        session.select_test("HbA1c");

        let charts = session.current_charts().unwrap();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].points.len(), 2);
        assert_eq!(charts[0].range.as_ref().unwrap().unit, "mmol/mol");
    }

    #[test]
    fn test_import_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let mut session = Session::default();
        let outcome = session.import_file(file.path()).unwrap();
        assert_eq!(outcome.accepted, 3);
    }

    #[test]
    fn test_import_file_too_large() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let config = SessionConfig {
            max_import_bytes: 10,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config);
        assert!(matches!(
            session.import_file(file.path()),
            Err(SessionError::FileTooLarge { limit: 10, .. })
        ));
        assert!(session.records().is_empty());
    }

    #[test]
    fn test_import_file_with_non_utf8_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Test,Date,Result,Notes\nUrate,01/03/2023,388,\xb5mol\n")
            .unwrap();

        let mut session = Session::default();
        let outcome = session.import_file(file.path()).unwrap();

        assert_eq!(outcome.accepted, 1);
        assert_eq!(session.records()[0].test, "Urate");
        assert_eq!(session.records()[0].result, 388.0);
    }

    #[test]
    fn test_missing_file_notification() {
        let mut session = Session::default();
        let err = session.import_file("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, SessionError::FileRead(_)));
        assert_eq!(err.notification().message, "Failed to read the file.");
    }
}
