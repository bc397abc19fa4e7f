//! Bloodlines Core Library
//!
//! Session-local tracking of personal blood-test results: import a
//! spreadsheet export, browse results by test or category, chart them
//! against clinical reference ranges, and edit or delete records.
//!
//! # Architecture
//!
//! ```text
//! CSV text ──▶ ingest::parse ──▶ candidate records
//!                                      │
//!                         store::merge (dedup on test + date)
//!                                      │
//!                                      ▼
//!                                 RecordStore ◀── edit / delete
//!                                      │
//!                    view::Projection (+ reference::RangeTable)
//!                                      │
//!                     ┌────────────────┴────────────────┐
//!                     ▼                                 ▼
//!                ChartSeries                        TableRow
//! ```
//!
//! Nothing is persisted: a [`Session`] starts empty and lives as long as
//! the front end keeps it.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Record, RangeSpec)
//! - [`reference`]: Reference range table and test catalog
//! - [`ingest`]: CSV parser and value rules
//! - [`store`]: Record store and deduplicating merge
//! - [`view`]: Chart and table projections
//! - [`session`]: Application state and user-facing flows
//! - [`export`]: CSV and JSON export
//! - [`config`]: Session configuration

pub mod config;
pub mod export;
pub mod ingest;
pub mod models;
pub mod reference;
pub mod session;
pub mod store;
pub mod view;

// Re-export commonly used types
pub use config::{RowErrorPolicy, SessionConfig};
pub use ingest::{parse, parse_with, ParseError, ParseReport};
pub use models::{RangeSpec, RangeStatus, Record, RecordKey};
pub use reference::{RangeTable, TestCatalog, TestCategory};
pub use session::{ImportOutcome, Notification, Session, SessionError, Severity, View};
pub use store::{merge, DedupScope, MergeResult, RecordStore, StoreError};
pub use view::{ChartSeries, Projection, TableRow};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use session::SessionResult;

use tracing_subscriber::EnvFilter;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum BloodlinesError {
    #[error("{0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("{0}")]
    FileRead(String),

    #[error("An import is already in progress")]
    ImportInProgress,

    #[error("Export error: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for BloodlinesError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Parse(e) => BloodlinesError::Parse(e.to_string()),
            SessionError::Value(e) => BloodlinesError::InvalidInput(e.to_string()),
            SessionError::UnknownCategory(_) => BloodlinesError::InvalidInput(e.to_string()),
            SessionError::Store(e) => BloodlinesError::IndexOutOfRange(e.to_string()),
            SessionError::FileRead(_) | SessionError::FileTooLarge { .. } => {
                BloodlinesError::FileRead(e.to_string())
            }
            SessionError::Export(e) => BloodlinesError::Export(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for BloodlinesError {
    fn from(e: serde_json::Error) -> Self {
        BloodlinesError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for BloodlinesError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        BloodlinesError::Internal(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the log subscriber. Honours `RUST_LOG`; safe to call twice.
#[uniffi::export]
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Start an empty session with default settings.
#[uniffi::export]
pub fn new_session() -> Arc<BloodlinesCore> {
    Arc::new(BloodlinesCore::wrap(Session::default()))
}

/// Start an empty session configured from JSON.
#[uniffi::export]
pub fn new_session_with_config(config_json: String) -> Result<Arc<BloodlinesCore>, BloodlinesError> {
    let config = SessionConfig::from_json(&config_json)?;
    Ok(Arc::new(BloodlinesCore::wrap(Session::new(config))))
}

/// Sidebar categories in display order.
#[uniffi::export]
pub fn test_categories() -> Vec<FfiTestCategory> {
    TestCatalog::standard()
        .categories()
        .iter()
        .cloned()
        .map(Into::into)
        .collect()
}

/// Sidebar search.
#[uniffi::export]
pub fn search_tests(query: String) -> Vec<FfiSearchHit> {
    TestCatalog::standard()
        .search(&query)
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Reference range for a test, if known.
#[uniffi::export]
pub fn lookup_range(test: String) -> Option<FfiRangeSpec> {
    RangeTable::standard().lookup(&test).cloned().map(Into::into)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct BloodlinesCore {
    session: Arc<Mutex<Session>>,
    importing: AtomicBool,
    last_failure: Mutex<Option<Notification>>,
}

/// Clears the import flag when an import finishes, however it finishes.
struct ImportGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ImportGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, BloodlinesError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BloodlinesError::ImportInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for ImportGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl BloodlinesCore {
    fn wrap(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            importing: AtomicBool::new(false),
            last_failure: Mutex::new(None),
        }
    }

    /// Remember the notification for a failed import step; a success clears it.
    fn track_import<T>(&self, result: SessionResult<T>) -> Result<T, BloodlinesError> {
        let mut last = self.last_failure.lock()?;
        match result {
            Ok(value) => {
                *last = None;
                Ok(value)
            }
            Err(e) => {
                *last = Some(e.notification());
                Err(e.into())
            }
        }
    }
}

#[uniffi::export]
impl BloodlinesCore {
    // =========================================================================
    // Import Operations
    // =========================================================================

    /// Import CSV text that the front end has already read.
    pub fn import_csv(&self, text: String) -> Result<FfiImportOutcome, BloodlinesError> {
        let _guard = ImportGuard::acquire(&self.importing)?;
        let mut session = self.session.lock()?;
        Ok(self.track_import(session.import_csv(&text))?.into())
    }

    /// Read and import a CSV file.
    ///
    /// The file is read without holding the session lock. A second import
    /// started before this one finishes is refused.
    pub fn import_csv_file(&self, path: String) -> Result<FfiImportOutcome, BloodlinesError> {
        let _guard = ImportGuard::acquire(&self.importing)?;
        let limit = self.session.lock()?.config().max_import_bytes;
        let text = self.track_import(session::read_import_file(Path::new(&path), limit))?;

        let mut session = self.session.lock()?;
        Ok(self.track_import(session.import_csv(&text))?.into())
    }

    /// Notification for the most recent import, if it failed.
    ///
    /// Carries the same title and message the session shows, e.g.
    /// "CSV Parsing Error" with the parser's message.
    pub fn last_import_failure(&self) -> Result<Option<FfiNotification>, BloodlinesError> {
        Ok(self.last_failure.lock()?.clone().map(Into::into))
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// All records in store order.
    pub fn records(&self) -> Result<Vec<FfiRecord>, BloodlinesError> {
        let session = self.session.lock()?;
        Ok(session.records().iter().map(Into::into).collect())
    }

    /// Replace a record from raw table inputs.
    pub fn edit_record(
        &self,
        index: u32,
        test: String,
        date: String,
        result: String,
    ) -> Result<(), BloodlinesError> {
        let mut session = self.session.lock()?;
        session.edit_record(index as usize, &test, &date, &result)?;
        Ok(())
    }

    /// Delete one record.
    pub fn delete_record(&self, index: u32) -> Result<(), BloodlinesError> {
        let mut session = self.session.lock()?;
        session.delete_record(index as usize)?;
        Ok(())
    }

    /// Delete several records.
    pub fn delete_records(&self, indices: Vec<u32>) -> Result<u32, BloodlinesError> {
        let mut session = self.session.lock()?;
        let removed = session.delete_records(indices.into_iter().map(|i| i as usize))?;
        Ok(removed.len() as u32)
    }

    /// Drop every record.
    pub fn clear(&self) -> Result<(), BloodlinesError> {
        self.session.lock()?.clear();
        Ok(())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn select_test(&self, test: String) -> Result<(), BloodlinesError> {
        self.session.lock()?.select_test(&test);
        Ok(())
    }

    pub fn select_category(&self, category: String) -> Result<(), BloodlinesError> {
        self.session.lock()?.select_category(&category)?;
        Ok(())
    }

    pub fn open_data_management(&self) -> Result<(), BloodlinesError> {
        self.session.lock()?.open_data_management();
        Ok(())
    }

    /// Expand or collapse a sidebar category. Returns whether it is now expanded.
    pub fn toggle_category(&self, category: String) -> Result<bool, BloodlinesError> {
        Ok(self.session.lock()?.toggle_category(&category))
    }

    pub fn expanded_categories(&self) -> Result<Vec<String>, BloodlinesError> {
        Ok(self.session.lock()?.expanded_categories().to_vec())
    }

    /// Current main-panel view.
    pub fn current_view(&self) -> Result<FfiView, BloodlinesError> {
        Ok(self.session.lock()?.view().clone().into())
    }

    // =========================================================================
    // Projections and Export
    // =========================================================================

    /// Chart data for one test.
    pub fn chart(&self, test: String) -> Result<FfiChartSeries, BloodlinesError> {
        Ok(self.session.lock()?.chart(&test).into())
    }

    /// Chart data for whatever the current view shows.
    pub fn current_charts(&self) -> Result<Vec<FfiChartSeries>, BloodlinesError> {
        let charts = self.session.lock()?.current_charts()?;
        Ok(charts.into_iter().map(Into::into).collect())
    }

    /// Data table rows.
    pub fn table(&self) -> Result<Vec<FfiTableRow>, BloodlinesError> {
        let rows = self.session.lock()?.table();
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub fn export_csv(&self) -> Result<String, BloodlinesError> {
        Ok(self.session.lock()?.export_csv()?)
    }

    pub fn export_json(&self) -> Result<String, BloodlinesError> {
        Ok(self.session.lock()?.export_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecord {
    pub test: String,
    /// `DD/MM/YYYY`
    pub date: String,
    /// RFC 3339 instant (UTC midnight)
    pub date_iso: String,
    pub result: f64,
}

impl From<&Record> for FfiRecord {
    fn from(record: &Record) -> Self {
        Self {
            test: record.test.clone(),
            date: record.display_date(),
            date_iso: record.date.to_rfc3339(),
            result: record.result,
        }
    }
}

/// FFI-safe reference range.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRangeSpec {
    pub test: String,
    pub unit: String,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub description: String,
}

impl From<RangeSpec> for FfiRangeSpec {
    fn from(spec: RangeSpec) -> Self {
        Self {
            description: spec.describe(),
            test: spec.test,
            unit: spec.unit,
            minimum: spec.minimum,
            maximum: spec.maximum,
        }
    }
}

/// FFI-safe chart point.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiChartPoint {
    pub date: String,
    pub date_iso: String,
    pub result: f64,
}

/// FFI-safe chart series.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiChartSeries {
    pub test: String,
    pub range: Option<FfiRangeSpec>,
    pub points: Vec<FfiChartPoint>,
}

impl From<ChartSeries> for FfiChartSeries {
    fn from(series: ChartSeries) -> Self {
        Self {
            test: series.test,
            range: series.range.map(Into::into),
            points: series
                .points
                .into_iter()
                .map(|p| FfiChartPoint {
                    date: ingest::format_date(&p.date),
                    date_iso: p.date.to_rfc3339(),
                    result: p.result,
                })
                .collect(),
        }
    }
}

/// FFI-safe range status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRangeStatus {
    Low,
    Normal,
    High,
    Unknown,
}

impl From<RangeStatus> for FfiRangeStatus {
    fn from(status: RangeStatus) -> Self {
        match status {
            RangeStatus::Low => FfiRangeStatus::Low,
            RangeStatus::Normal => FfiRangeStatus::Normal,
            RangeStatus::High => FfiRangeStatus::High,
            RangeStatus::Unknown => FfiRangeStatus::Unknown,
        }
    }
}

/// FFI-safe table row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTableRow {
    pub index: u32,
    pub test: String,
    pub date: String,
    pub result: f64,
    pub unit: String,
    pub range: Option<String>,
    pub status: FfiRangeStatus,
}

impl From<TableRow> for FfiTableRow {
    fn from(row: TableRow) -> Self {
        Self {
            index: row.index as u32,
            unit: row.unit_label().to_string(),
            test: row.test,
            date: row.date,
            result: row.result,
            range: row.range,
            status: row.status.into(),
        }
    }
}

/// FFI-safe notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSeverity {
    Info,
    Warning,
    Error,
}

impl From<Severity> for FfiSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => FfiSeverity::Info,
            Severity::Warning => FfiSeverity::Warning,
            Severity::Error => FfiSeverity::Error,
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub severity: FfiSeverity,
    pub title: String,
    pub message: String,
}

impl From<Notification> for FfiNotification {
    fn from(n: Notification) -> Self {
        Self {
            severity: n.severity.into(),
            title: n.title,
            message: n.message,
        }
    }
}

/// FFI-safe import summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportOutcome {
    pub parsed: u32,
    pub skipped_lines: Vec<u32>,
    pub accepted: u32,
    pub duplicates: u32,
    pub unknown_tests: Vec<String>,
    pub notifications: Vec<FfiNotification>,
}

impl From<ImportOutcome> for FfiImportOutcome {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            parsed: outcome.parsed as u32,
            skipped_lines: outcome.skipped.iter().map(|s| s.line as u32).collect(),
            accepted: outcome.accepted as u32,
            duplicates: outcome.duplicates as u32,
            unknown_tests: outcome.unknown_tests.into_iter().map(|u| u.test).collect(),
            notifications: outcome.notifications.into_iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe main-panel view.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiView {
    Welcome,
    Test { name: String },
    Category { name: String },
    DataManagement,
}

impl From<View> for FfiView {
    fn from(view: View) -> Self {
        match view {
            View::Welcome => FfiView::Welcome,
            View::Test(name) => FfiView::Test { name },
            View::Category(name) => FfiView::Category { name },
            View::DataManagement => FfiView::DataManagement,
        }
    }
}

/// FFI-safe test category.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTestCategory {
    pub name: String,
    pub tests: Vec<String>,
}

impl From<TestCategory> for FfiTestCategory {
    fn from(category: TestCategory) -> Self {
        Self {
            name: category.name,
            tests: category.tests,
        }
    }
}

/// FFI-safe search hit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSearchHit {
    pub test: String,
    pub category: String,
    pub score: f64,
}

impl From<reference::SearchHit> for FfiSearchHit {
    fn from(hit: reference::SearchHit) -> Self {
        Self {
            test: hit.test,
            category: hit.category,
            score: hit.score,
        }
    }
}
