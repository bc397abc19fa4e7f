//! Test catalog: the categories shown in the sidebar, and test search.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

/// Minimum similarity for a fuzzy search hit.
const FUZZY_THRESHOLD: f64 = 0.80;

/// A named group of related tests (e.g., "Lipid Profile").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCategory {
    /// Category label
    pub name: String,
    /// Member test names, in display order
    pub tests: Vec<String>,
}

/// A search result for the sidebar search box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Matching test name
    pub test: String,
    /// Category the test belongs to
    pub category: String,
    /// Match quality (1.0 for substring matches)
    pub score: f64,
}

impl TestCategory {
    fn new(name: &str, tests: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            tests: tests.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Check if a test belongs to this category.
    pub fn contains(&self, test: &str) -> bool {
        self.tests.iter().any(|t| t == test)
    }
}

/// Ordered collection of test categories.
#[derive(Debug, Clone)]
pub struct TestCatalog {
    categories: Vec<TestCategory>,
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCatalog {
    /// Create the default catalog.
    pub fn new() -> Self {
        Self {
            categories: Self::default_categories(),
        }
    }

    /// Shared process-wide catalog.
    pub fn standard() -> &'static TestCatalog {
        static CATALOG: OnceLock<TestCatalog> = OnceLock::new();
        CATALOG.get_or_init(TestCatalog::new)
    }

    /// All categories in display order.
    pub fn categories(&self) -> &[TestCategory] {
        &self.categories
    }

    /// Find a category by its name.
    pub fn category(&self, name: &str) -> Option<&TestCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Find the category a test belongs to.
    pub fn category_of(&self, test: &str) -> Option<&TestCategory> {
        self.categories.iter().find(|c| c.contains(test))
    }

    /// Every test in the catalog, in display order.
    pub fn all_tests(&self) -> impl Iterator<Item = (&TestCategory, &str)> {
        self.categories
            .iter()
            .flat_map(|c| c.tests.iter().map(move |t| (c, t.as_str())))
    }

    /// Search tests by name.
    ///
    /// Substring matches (case-insensitive) come first in catalog order,
    /// followed by fuzzy matches ranked by similarity. An empty query
    /// returns every test.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();

        let mut hits: Vec<SearchHit> = self
            .all_tests()
            .filter_map(|(category, test)| {
                let name = test.to_lowercase();
                let score = if name.contains(&query) {
                    1.0
                } else {
                    jaro_winkler(&query, &name)
                };

                (score >= FUZZY_THRESHOLD).then(|| SearchHit {
                    test: test.to_string(),
                    category: category.name.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps catalog order among equal scores
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }

    fn default_categories() -> Vec<TestCategory> {
        vec![
            TestCategory::new("Glucose", &["HbA1c"]),
            TestCategory::new(
                "Lipid Profile",
                &[
                    "Total Cholesterol",
                    "HDL Cholesterol",
                    "Non-HDL Cholesterol",
                    "LDL Cholesterol",
                    "Total Cholesterol:HDL Ratio",
                    "Triglyceride",
                ],
            ),
            TestCategory::new(
                "Kidney",
                &[
                    "Urea",
                    "Sodium",
                    "Potassium",
                    "Creatinine",
                    "Albumin",
                    "eGFR",
                    "Urinary Creatinine",
                    "Microalbumin",
                    "Microalbumin Creatinine Ratio",
                ],
            ),
            TestCategory::new(
                "Liver",
                &[
                    "Total Protein",
                    "Total Bilirubin",
                    "Alkaline Phosphatase",
                    "Gamma GT",
                    "AST",
                    "Alanine Transaminase",
                ],
            ),
            TestCategory::new("Urate", &["Urate"]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::RangeTable;

    #[test]
    fn test_category_order() {
        let catalog = TestCatalog::new();
        let names: Vec<&str> = catalog.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Glucose", "Lipid Profile", "Kidney", "Liver", "Urate"]);
    }

    #[test]
    fn test_category_of() {
        let catalog = TestCatalog::new();
        assert_eq!(catalog.category_of("eGFR").unwrap().name, "Kidney");
        assert_eq!(catalog.category_of("Gamma GT").unwrap().name, "Liver");
        assert!(catalog.category_of("Ferritin").is_none());
    }

    #[test]
    fn test_every_catalog_test_has_a_range() {
        let catalog = TestCatalog::new();
        let table = RangeTable::new();
        for (_, test) in catalog.all_tests() {
            assert!(table.lookup(test).is_some(), "no range for {}", test);
        }
    }

    #[test]
    fn test_search_substring_first() {
        let catalog = TestCatalog::new();
        let hits = catalog.search("cholesterol");

        let tests: Vec<&str> = hits.iter().map(|h| h.test.as_str()).collect();
        assert_eq!(
            &tests[..5],
            &[
                "Total Cholesterol",
                "HDL Cholesterol",
                "Non-HDL Cholesterol",
                "LDL Cholesterol",
                "Total Cholesterol:HDL Ratio",
            ]
        );
        assert!(hits[..5].iter().all(|h| h.score == 1.0));
        assert_eq!(hits[0].category, "Lipid Profile");
    }

    #[test]
    fn test_search_fuzzy() {
        let catalog = TestCatalog::new();
        let hits = catalog.search("potasium");
        assert_eq!(hits[0].test, "Potassium");
        assert!(hits[0].score < 1.0);
    }

    #[test]
    fn test_search_empty_query_lists_all() {
        let catalog = TestCatalog::new();
        assert_eq!(catalog.search("  ").len(), catalog.all_tests().count());
    }

    #[test]
    fn test_search_no_match() {
        let catalog = TestCatalog::new();
        assert!(catalog.search("zzzzzz").is_empty());
    }
}
