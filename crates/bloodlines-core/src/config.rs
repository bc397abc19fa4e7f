//! Session configuration.

use serde::{Deserialize, Serialize};

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "bloodlines_core=info"
}

/// Largest CSV file accepted by file imports (5 MiB).
pub const DEFAULT_MAX_IMPORT_BYTES: u64 = 5 * 1024 * 1024;

/// What to do with a data row whose Result or Date cannot be parsed.
///
/// Rows with the wrong number of fields, or an empty Test/Date/Result,
/// are always skipped regardless of this policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Fail the whole import; nothing is merged
    #[default]
    Abort,
    /// Skip the row and record it in the parse report
    Skip,
}

/// Tunables for a browsing session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Handling of rows with unparseable values
    pub row_error_policy: RowErrorPolicy,
    /// Also drop repeated (test, date) keys inside one upload
    pub dedup_within_batch: bool,
    /// Maximum file size for [`Session::import_file`](crate::session::Session::import_file)
    pub max_import_bytes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            row_error_policy: RowErrorPolicy::Abort,
            dedup_within_batch: true,
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
        }
    }
}

impl SessionConfig {
    /// Load from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
