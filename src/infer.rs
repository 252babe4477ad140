//! Best-effort, sample-based column type inference.
//!
//! Classification looks at a bounded prefix of the records rather than the
//! whole dataset and uses an 80% dominance threshold, so it is a heuristic,
//! not a guarantee. The threshold and the date > number > boolean > string
//! precedence are compatibility contracts: downstream consumers depend on
//! the exact classification behavior.

use crate::data::{Dataset, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// Number of leading records inspected per column.
pub const SAMPLE_SIZE: usize = 50;

/// Share of non-null sampled values a type must reach to dominate.
const DOMINANCE_THRESHOLD: f64 = 0.8;

/// ISO-style date, optionally with time-of-day and offset or UTC marker.
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?)?$")
        .expect("date pattern is valid")
});

/// Inferred semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    String,
    Boolean,
    Date,
    Unknown,
}

/// Per-column inferred types plus derived buckets.
///
/// Every header appears in `column_types`; a header joins at most one of
/// the four derived buckets (`Unknown` columns join none).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnClassification {
    pub numeric_columns: Vec<String>,
    pub category_columns: Vec<String>,
    pub time_columns: Vec<String>,
    pub boolean_columns: Vec<String>,
    pub column_types: HashMap<String, ColumnType>,
}

impl ColumnClassification {
    fn empty() -> Self {
        ColumnClassification {
            numeric_columns: Vec::new(),
            category_columns: Vec::new(),
            time_columns: Vec::new(),
            boolean_columns: Vec::new(),
            column_types: HashMap::new(),
        }
    }
}

/// Classify every column of the dataset by sampling the first
/// [`SAMPLE_SIZE`] records.
pub fn classify(dataset: &Dataset) -> ColumnClassification {
    let mut analysis = ColumnClassification::empty();
    let sample = &dataset.records[..dataset.records.len().min(SAMPLE_SIZE)];

    for header in &dataset.headers {
        let mut number_count = 0usize;
        let mut boolean_count = 0usize;
        let mut date_count = 0usize;
        let mut non_null = 0usize;

        for record in sample {
            let value = match record.get(header) {
                Some(Value::Null) | None => continue,
                Some(v) => v,
            };
            non_null += 1;
            match value {
                Value::Number(_) => number_count += 1,
                Value::Bool(_) => boolean_count += 1,
                Value::String(s) => {
                    // A numeric-looking string counts as a number and never
                    // reaches the date check, so e.g. "2024" tallies numeric.
                    if !s.trim().is_empty() && s.trim().parse::<f64>().is_ok() {
                        number_count += 1;
                    } else if DATE_PATTERN.is_match(s) {
                        date_count += 1;
                    }
                }
                Value::Null => {}
            }
        }

        let threshold = non_null as f64 * DOMINANCE_THRESHOLD;
        let dominant = if non_null == 0 {
            ColumnType::Unknown
        } else if date_count > 0 && date_count as f64 >= threshold {
            analysis.time_columns.push(header.clone());
            ColumnType::Date
        } else if number_count > 0 && number_count as f64 >= threshold {
            analysis.numeric_columns.push(header.clone());
            ColumnType::Number
        } else if boolean_count > 0 && boolean_count as f64 >= threshold {
            analysis.boolean_columns.push(header.clone());
            ColumnType::Boolean
        } else {
            // Mixed or low-confidence columns fall back to categorical.
            analysis.category_columns.push(header.clone());
            ColumnType::String
        };
        analysis.column_types.insert(header.clone(), dominant);
    }

    tracing::debug!(types = ?analysis.column_types, "column type analysis");
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::parse_csv;

    fn classify_csv(csv: &str) -> ColumnClassification {
        classify(&parse_csv(csv).unwrap())
    }

    fn column_csv(header: &str, values: &[&str]) -> String {
        let mut csv = format!("{header}\n");
        for v in values {
            csv.push_str(v);
            csv.push('\n');
        }
        csv
    }

    #[test]
    fn test_basic_classification() {
        let analysis = classify_csv("category,value\nAlpha,10\nBeta,20");
        assert_eq!(analysis.numeric_columns, vec!["value"]);
        assert_eq!(analysis.category_columns, vec!["category"]);
        assert_eq!(analysis.column_types["value"], ColumnType::Number);
        assert_eq!(analysis.column_types["category"], ColumnType::String);
    }

    #[test]
    fn test_date_column() {
        let csv = column_csv(
            "day",
            &["2024-01-01", "2024-01-02", "2024-01-03T10:30:00Z"],
        );
        let analysis = classify_csv(&csv);
        assert_eq!(analysis.time_columns, vec!["day"]);
        assert_eq!(analysis.column_types["day"], ColumnType::Date);
    }

    #[test]
    fn test_boolean_column() {
        let csv = column_csv("flag", &["true", "false", "true", "true"]);
        let analysis = classify_csv(&csv);
        assert_eq!(analysis.boolean_columns, vec!["flag"]);
        assert_eq!(analysis.column_types["flag"], ColumnType::Boolean);
    }

    #[test]
    fn test_threshold_met_at_80_percent() {
        // 8 of 10 non-null values numeric: exactly at the threshold
        let values: Vec<&str> = vec!["1", "2", "3", "4", "5", "6", "7", "8", "x", "y"];
        let analysis = classify_csv(&column_csv("col", &values));
        assert_eq!(analysis.numeric_columns, vec!["col"]);
    }

    #[test]
    fn test_threshold_missed_below_80_percent() {
        // 7 of 10 numeric: falls back to categorical, not numeric
        let values: Vec<&str> = vec!["1", "2", "3", "4", "5", "6", "7", "x", "y", "z"];
        let analysis = classify_csv(&column_csv("col", &values));
        assert!(analysis.numeric_columns.is_empty());
        assert_eq!(analysis.category_columns, vec!["col"]);
    }

    #[test]
    fn test_precedence_numeric_string_never_counts_as_date() {
        // "2024" parses as a number, so the date tally never sees it
        let csv = column_csv("year", &["2024", "2023", "2022"]);
        let analysis = classify_csv(&csv);
        assert_eq!(analysis.column_types["year"], ColumnType::Number);
        assert!(analysis.time_columns.is_empty());
    }

    #[test]
    fn test_empty_column_is_unknown() {
        let analysis = classify_csv("a,b\n1,\n2,\n3,");
        assert_eq!(analysis.column_types["b"], ColumnType::Unknown);
        assert!(analysis.numeric_columns.iter().all(|c| c != "b"));
        assert!(analysis.category_columns.iter().all(|c| c != "b"));
        assert!(analysis.time_columns.iter().all(|c| c != "b"));
        assert!(analysis.boolean_columns.iter().all(|c| c != "b"));
    }

    #[test]
    fn test_sample_bounded_to_prefix() {
        // First 50 rows numeric, the rest text: only the prefix is sampled
        let mut values: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        values.extend((0..50).map(|_| "text".to_string()));
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let analysis = classify_csv(&column_csv("col", &refs));
        assert_eq!(analysis.numeric_columns, vec!["col"]);
    }

    #[test]
    fn test_nulls_excluded_from_sample_count() {
        // 4 numeric of 5 non-null (80%): nulls must not dilute the ratio
        let csv = column_csv("col", &["1", "", "2", "", "3", "4", "x"]);
        let analysis = classify_csv(&csv);
        assert_eq!(analysis.numeric_columns, vec!["col"]);
    }

    #[test]
    fn test_idempotent() {
        let data = parse_csv("a,b,c\n1,x,2024-01-01\n2,y,2024-01-02").unwrap();
        assert_eq!(classify(&data), classify(&data));
    }
}
