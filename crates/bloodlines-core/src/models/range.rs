//! Clinical reference ranges.

use serde::{Deserialize, Serialize};

/// Reference metadata for a single test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeSpec {
    /// Exact test name this range applies to
    pub test: String,
    /// Reporting unit (empty for dimensionless ratios)
    pub unit: String,
    /// Lower bound of the normal range, if any
    pub minimum: Option<f64>,
    /// Upper bound of the normal range, if any
    pub maximum: Option<f64>,
}

/// Where a result sits relative to its reference range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RangeStatus {
    /// Below the minimum
    Low,
    /// Within all present bounds
    Normal,
    /// Above the maximum
    High,
    /// No reference range is known for the test
    Unknown,
}

impl RangeSpec {
    /// Create a range spec.
    pub fn new(
        test: impl Into<String>,
        unit: impl Into<String>,
        minimum: Option<f64>,
        maximum: Option<f64>,
    ) -> Self {
        Self {
            test: test.into(),
            unit: unit.into(),
            minimum,
            maximum,
        }
    }

    /// Classify a result against this range.
    pub fn status(&self, result: f64) -> RangeStatus {
        match (self.minimum, self.maximum) {
            (Some(min), _) if result < min => RangeStatus::Low,
            (_, Some(max)) if result > max => RangeStatus::High,
            _ => RangeStatus::Normal,
        }
    }

    /// Whether both bounds are present, so a normal band can be drawn.
    pub fn has_band(&self) -> bool {
        self.minimum.is_some() && self.maximum.is_some()
    }

    /// Human-readable range, e.g. `"200 - 430 µmol/L"` or `"N/A - 5 mmol/L"`.
    pub fn describe(&self) -> String {
        let bound = |b: Option<f64>| b.map_or_else(|| "N/A".to_string(), |v| v.to_string());
        let text = format!("{} - {} {}", bound(self.minimum), bound(self.maximum), self.unit);
        text.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_two_sided() {
        let range = RangeSpec::new("Sodium", "mmol/L", Some(133.0), Some(146.0));

        assert_eq!(range.status(120.0), RangeStatus::Low);
        assert_eq!(range.status(133.0), RangeStatus::Normal);
        assert_eq!(range.status(146.0), RangeStatus::Normal);
        assert_eq!(range.status(150.5), RangeStatus::High);
    }

    #[test]
    fn test_status_one_sided() {
        let upper_only = RangeSpec::new("Triglyceride", "mmol/L", None, Some(1.7));
        assert_eq!(upper_only.status(-3.0), RangeStatus::Normal);
        assert_eq!(upper_only.status(2.0), RangeStatus::High);

        let lower_only = RangeSpec::new("eGFR", "mL/min/1.73m²", Some(90.0), None);
        assert_eq!(lower_only.status(60.0), RangeStatus::Low);
        assert_eq!(lower_only.status(1000.0), RangeStatus::Normal);
        assert!(!lower_only.has_band());
    }

    #[test]
    fn test_describe() {
        let urate = RangeSpec::new("Urate", "µmol/L", Some(200.0), Some(430.0));
        assert_eq!(urate.describe(), "200 - 430 µmol/L");

        let cholesterol = RangeSpec::new("Total Cholesterol", "mmol/L", None, Some(5.0));
        assert_eq!(cholesterol.describe(), "N/A - 5 mmol/L");

        let ratio = RangeSpec::new("Total Cholesterol:HDL Ratio", "", None, Some(4.0));
        assert_eq!(ratio.describe(), "N/A - 4");
    }
}
