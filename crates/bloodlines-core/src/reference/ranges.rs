//! Reference range table and lookup.
//!
//! Lookup is by exact, case-sensitive test name. An unknown name is not an
//! error: callers treat it as "unit/range unknown".

use std::collections::HashMap;
use std::sync::OnceLock;

use strsim::jaro_winkler;

use crate::models::RangeSpec;

/// Minimum similarity for a name suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Lookup table from test name to [`RangeSpec`].
#[derive(Debug, Clone)]
pub struct RangeTable {
    ranges: HashMap<String, RangeSpec>,
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeTable {
    /// Create a table populated with the default adult reference ranges.
    pub fn new() -> Self {
        let ranges = Self::default_ranges()
            .into_iter()
            .map(|spec| (spec.test.clone(), spec))
            .collect();
        Self { ranges }
    }

    /// Create a table with no entries.
    pub fn empty() -> Self {
        Self {
            ranges: HashMap::new(),
        }
    }

    /// Shared process-wide table.
    pub fn standard() -> &'static RangeTable {
        static TABLE: OnceLock<RangeTable> = OnceLock::new();
        TABLE.get_or_init(RangeTable::new)
    }

    /// Look up the range for a test name (exact match).
    pub fn lookup(&self, test: &str) -> Option<&RangeSpec> {
        self.ranges.get(test)
    }

    /// Add or replace a range.
    pub fn insert(&mut self, spec: RangeSpec) {
        self.ranges.insert(spec.test.clone(), spec);
    }

    /// Number of known tests.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// All known test names, sorted.
    pub fn test_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ranges.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Suggest the closest known test name for an unrecognised one.
    ///
    /// Returns `None` when the name is already known or nothing is close.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        if self.ranges.contains_key(name) {
            return None;
        }

        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        let mut best: Option<(&str, f64)> = None;
        for candidate in self.test_names() {
            let score = jaro_winkler(&query, &candidate.to_lowercase());
            if score < SUGGESTION_THRESHOLD {
                continue;
            }
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((candidate, score)),
            }
        }

        best.map(|(candidate, _)| candidate)
    }

    /// Default UK adult reference ranges.
    fn default_ranges() -> Vec<RangeSpec> {
        let mmol = "mmol/L";
        let umol = "µmol/L";
        let units = "U/L";

        vec![
            // Glucose
            RangeSpec::new("HbA1c", "mmol/mol", Some(20.0), Some(41.0)),
            // Lipid profile
            RangeSpec::new("Total Cholesterol", mmol, None, Some(5.0)),
            RangeSpec::new("HDL Cholesterol", mmol, Some(1.0), None),
            RangeSpec::new("Non-HDL Cholesterol", mmol, None, Some(4.0)),
            RangeSpec::new("LDL Cholesterol", mmol, None, Some(3.0)),
            RangeSpec::new("Total Cholesterol:HDL Ratio", "", None, Some(4.0)),
            RangeSpec::new("Triglyceride", mmol, None, Some(1.7)),
            // Kidney
            RangeSpec::new("Urea", mmol, Some(2.5), Some(7.8)),
            RangeSpec::new("Sodium", mmol, Some(133.0), Some(146.0)),
            RangeSpec::new("Potassium", mmol, Some(3.5), Some(5.3)),
            RangeSpec::new("Creatinine", umol, Some(59.0), Some(104.0)),
            RangeSpec::new("Albumin", "g/L", Some(35.0), Some(50.0)),
            RangeSpec::new("eGFR", "mL/min/1.73m²", Some(90.0), None),
            RangeSpec::new("Urinary Creatinine", mmol, Some(2.5), Some(20.0)),
            RangeSpec::new("Microalbumin", "mg/L", None, Some(20.0)),
            RangeSpec::new("Microalbumin Creatinine Ratio", "mg/mmol", None, Some(3.0)),
            // Liver
            RangeSpec::new("Total Protein", "g/L", Some(60.0), Some(80.0)),
            RangeSpec::new("Total Bilirubin", umol, Some(0.0), Some(21.0)),
            RangeSpec::new("Alkaline Phosphatase", units, Some(30.0), Some(130.0)),
            RangeSpec::new("Gamma GT", units, Some(0.0), Some(60.0)),
            RangeSpec::new("AST", units, Some(0.0), Some(40.0)),
            RangeSpec::new("Alanine Transaminase", units, Some(0.0), Some(40.0)),
            // Urate
            RangeSpec::new("Urate", umol, Some(200.0), Some(430.0)),
        ]
    }
}
