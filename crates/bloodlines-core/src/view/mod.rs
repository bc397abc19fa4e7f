//! Read-only projections of the store for chart and table consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{RangeSpec, RangeStatus, Record};
use crate::reference::{RangeTable, TestCategory};
use crate::store::RecordStore;

/// Shown in place of a unit when a test has no reference range.
pub const UNKNOWN_UNIT_LABEL: &str = "unit unknown";

/// One plotted measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub date: DateTime<Utc>,
    pub result: f64,
}

/// Everything a chart renderer needs for one test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    /// Test being charted
    pub test: String,
    /// Reference range, if the test is known
    pub range: Option<RangeSpec>,
    /// Measurements in chronological order
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// True when the renderer should show its "no data" placeholder.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One row of the data table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableRow {
    /// Position in the store (used for edit/delete intents)
    pub index: usize,
    pub test: String,
    /// `DD/MM/YYYY`
    pub date: String,
    pub result: f64,
    /// Unit from the range table, if known
    pub unit: Option<String>,
    /// Range text such as `"200 - 430 µmol/L"`, if known
    pub range: Option<String>,
    pub status: RangeStatus,
}

impl TableRow {
    /// Unit text for display.
    pub fn unit_label(&self) -> &str {
        self.unit.as_deref().unwrap_or(UNKNOWN_UNIT_LABEL)
    }
}

/// Projection over a store using a range table.
pub struct Projection<'a> {
    store: &'a RecordStore,
    ranges: &'a RangeTable,
}

impl<'a> Projection<'a> {
    /// Project using a specific range table.
    pub fn with_ranges(store: &'a RecordStore, ranges: &'a RangeTable) -> Self {
        Self { store, ranges }
    }

    /// Chart data for one test.
    pub fn chart(&self, test: &str) -> ChartSeries {
        let mut points: Vec<ChartPoint> = self
            .store
            .select_by_test(test)
            .into_iter()
            .map(|r| ChartPoint {
                date: r.date,
                result: r.result,
            })
            .collect();
        points.sort_by_key(|p| p.date);

        ChartSeries {
            test: test.to_string(),
            range: self.ranges.lookup(test).cloned(),
            points,
        }
    }

    /// Chart data for every test of a category, in category order.
    pub fn category_charts(&self, category: &TestCategory) -> Vec<ChartSeries> {
        category.tests.iter().map(|t| self.chart(t)).collect()
    }

    /// Table rows for the whole store.
    pub fn table(&self) -> Vec<TableRow> {
        self.rows(|_| true)
    }

    /// Table rows for the given tests only.
    pub fn table_for<S: AsRef<str>>(&self, tests: &[S]) -> Vec<TableRow> {
        self.rows(|r| tests.iter().any(|t| t.as_ref() == r.test))
    }

    fn rows(&self, keep: impl Fn(&Record) -> bool) -> Vec<TableRow> {
        self.store
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| keep(*r))
            .map(|(index, r)| self.row(index, r))
            .collect()
    }

    fn row(&self, index: usize, record: &Record) -> TableRow {
        let range = self.ranges.lookup(&record.test);
        TableRow {
            index,
            test: record.test.clone(),
            date: record.display_date(),
            result: record.result,
            unit: range.map(|r| r.unit.clone()),
            range: range.map(RangeSpec::describe),
            status: range.map_or(RangeStatus::Unknown, |r| r.status(record.result)),
        }
    }
}
