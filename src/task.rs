//! Request validation and task orchestration.
//!
//! A task payload moves through a fixed sequence: shape checks, CSV
//! parsing, then either the analyze branch (classification + suggestions)
//! or the create branch (chart parameter validation + rendering). Checks
//! run in a contractual order and the first failure short-circuits with a
//! check-specific error.

use crate::csv_reader::{self, CsvError};
use crate::error::TaskError;
use crate::graph::{self, ChartRequest};
use crate::infer::{self, ColumnType};
use crate::suggest;
use crate::ChartKind;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Result of the analyze branch, shaped for the response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub suggested_chart_types: Vec<ChartKind>,
    pub analysis_details: AnalysisDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetails {
    pub numeric_columns: Vec<String>,
    pub category_columns: Vec<String>,
    pub time_columns: Vec<String>,
    pub boolean_columns: Vec<String>,
    pub all_column_types: HashMap<String, ColumnType>,
}

/// Successful task outcome, one variant per task type.
#[derive(Debug)]
pub enum TaskOutcome {
    Analysis(AnalysisResult),
    Chart(String),
}

/// Run one task payload to completion or failure.
///
/// The payload arrives as loosely typed JSON on purpose: each field is
/// checked individually so every failure maps to its own error code
/// rather than a generic deserialization error.
pub fn run_task(payload: &JsonValue) -> Result<TaskOutcome, TaskError> {
    let task = payload.as_object().ok_or_else(|| {
        TaskError::BadRequest("Invalid or missing JSON payload.".to_string())
    })?;

    let task_type = task.get("taskType").and_then(JsonValue::as_str);
    let task_type = match task_type {
        Some(t @ ("analyze" | "create")) => t,
        _ => {
            return Err(TaskError::InvalidTaskType(
                "Missing or invalid taskType field (must be 'analyze' or 'create')."
                    .to_string(),
            ))
        }
    };

    let csv_data = task.get("csvData").and_then(JsonValue::as_str);
    let csv_data = match csv_data {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return Err(TaskError::MissingInput(
                "Missing or empty csvData field (string) is required.".to_string(),
            ))
        }
    };

    let dataset = csv_reader::parse_csv(csv_data).map_err(|e| match e {
        CsvError::Malformed(_) => TaskError::InvalidCsvFormat(e.to_string()),
        CsvError::Empty => TaskError::EmptyData(e.to_string()),
    })?;

    match task_type {
        "analyze" => {
            tracing::info!("routing task to analyze branch");
            let analysis = infer::classify(&dataset);
            let suggested_chart_types = suggest::suggest(&analysis);
            Ok(TaskOutcome::Analysis(AnalysisResult {
                suggested_chart_types,
                analysis_details: AnalysisDetails {
                    numeric_columns: analysis.numeric_columns,
                    category_columns: analysis.category_columns,
                    time_columns: analysis.time_columns,
                    boolean_columns: analysis.boolean_columns,
                    all_column_types: analysis.column_types,
                },
            }))
        }
        "create" => {
            tracing::info!("routing task to create branch");
            let (kind, request) = validate_chart_params(task, &dataset.headers)?;
            let data_uri = graph::render_chart(&dataset, kind, &request)
                .map_err(|e| TaskError::ChartGenerationFailed(format!("{e:#}")))?;
            Ok(TaskOutcome::Chart(data_uri))
        }
        // taskType was validated above; reaching here means the routing
        // and validation fell out of sync
        _ => Err(TaskError::UnexpectedState(
            "Task routing reached an unhandled task type.".to_string(),
        )),
    }
}

/// Validate create-task parameters in contractual order; the first failing
/// check wins and later checks are not evaluated.
fn validate_chart_params(
    task: &serde_json::Map<String, JsonValue>,
    headers: &[String],
) -> Result<(ChartKind, ChartRequest), TaskError> {
    // (i) chartType present and one of bar/line/pie
    let kind = task
        .get("chartType")
        .and_then(JsonValue::as_str)
        .and_then(ChartKind::from_name)
        .ok_or_else(|| {
            TaskError::InvalidParameter(
                "Invalid or missing chartType (must be bar, line, or pie) for create task."
                    .to_string(),
            )
        })?;

    // (ii) options present and an object
    let options = task
        .get("options")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| {
            TaskError::MissingParameter("Missing options object for create task.".to_string())
        })?;

    // (iii) labelColumn present and a string
    let label_column = options
        .get("labelColumn")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| {
            TaskError::MissingParameter(
                "Missing or invalid options.labelColumn (string).".to_string(),
            )
        })?;

    // (iv) dataColumns present, an array, non-empty
    let data_columns = options
        .get("dataColumns")
        .and_then(JsonValue::as_array)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| {
            TaskError::MissingParameter(
                "Missing or invalid options.dataColumns (non-empty array).".to_string(),
            )
        })?;

    // (v) labelColumn exists in the parsed headers
    if !headers.iter().any(|h| h == label_column) {
        return Err(TaskError::InvalidParameter(format!(
            "Label column '{label_column}' not found in CSV headers."
        )));
    }

    // (vi) every dataColumns entry is a string naming a parsed header
    let mut columns: Vec<String> = Vec::with_capacity(data_columns.len());
    for col in data_columns {
        match col.as_str() {
            Some(name) if headers.iter().any(|h| h == name) => {
                columns.push(name.to_string());
            }
            _ => {
                let shown = col
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| col.to_string());
                return Err(TaskError::InvalidParameter(format!(
                    "Data column '{shown}' is invalid or not found in CSV headers."
                )));
            }
        }
    }

    let title = options
        .get("title")
        .and_then(JsonValue::as_str)
        .map(str::to_string);

    Ok((
        kind,
        ChartRequest {
            label_column: label_column.to_string(),
            data_columns: columns,
            title,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expect_err(payload: JsonValue) -> TaskError {
        run_task(&payload).unwrap_err()
    }

    #[test]
    fn test_payload_must_be_object() {
        assert!(matches!(
            expect_err(json!("not an object")),
            TaskError::BadRequest(_)
        ));
    }

    #[test]
    fn test_task_type_checked_before_csv() {
        let err = expect_err(json!({ "csvData": "a,b\n1,2" }));
        assert!(matches!(err, TaskError::InvalidTaskType(_)));

        let err = expect_err(json!({ "taskType": "delete", "csvData": "a,b\n1,2" }));
        assert!(matches!(err, TaskError::InvalidTaskType(_)));
    }

    #[test]
    fn test_missing_or_blank_csv() {
        let err = expect_err(json!({ "taskType": "analyze" }));
        assert!(matches!(err, TaskError::MissingInput(_)));

        let err = expect_err(json!({ "taskType": "analyze", "csvData": "   " }));
        assert!(matches!(err, TaskError::MissingInput(_)));
    }

    #[test]
    fn test_malformed_vs_empty_csv() {
        let err = expect_err(json!({
            "taskType": "analyze",
            "csvData": "a,b\n\"oops,2"
        }));
        assert!(matches!(err, TaskError::InvalidCsvFormat(_)));

        let err = expect_err(json!({ "taskType": "analyze", "csvData": "h1,h2" }));
        assert!(matches!(err, TaskError::EmptyData(_)));
    }

    #[test]
    fn test_analyze_outcome() {
        let outcome = run_task(&json!({
            "taskType": "analyze",
            "csvData": "category,value\nAlpha,10\nBeta,20"
        }))
        .unwrap();
        let analysis = match outcome {
            TaskOutcome::Analysis(a) => a,
            other => panic!("expected analysis, got {other:?}"),
        };
        assert_eq!(
            analysis.suggested_chart_types,
            vec![ChartKind::Bar, ChartKind::Pie, ChartKind::Line]
        );
        assert_eq!(analysis.analysis_details.numeric_columns, vec!["value"]);
        assert_eq!(analysis.analysis_details.category_columns, vec!["category"]);
    }

    #[test]
    fn test_chart_type_checked_before_options() {
        // Both chartType and options are wrong: chartType failure wins
        let err = expect_err(json!({
            "taskType": "create",
            "csvData": "a,b\n1,2",
            "chartType": "bubble"
        }));
        match err {
            TaskError::InvalidParameter(msg) => assert!(msg.contains("chartType"), "{msg}"),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_options_object() {
        let err = expect_err(json!({
            "taskType": "create",
            "csvData": "a,b\n1,2",
            "chartType": "bar"
        }));
        assert!(matches!(err, TaskError::MissingParameter(_)));
    }

    #[test]
    fn test_missing_label_column_field() {
        let err = expect_err(json!({
            "taskType": "create",
            "csvData": "a,b\n1,2",
            "chartType": "bar",
            "options": { "dataColumns": ["b"] }
        }));
        match err {
            TaskError::MissingParameter(msg) => assert!(msg.contains("labelColumn"), "{msg}"),
            other => panic!("expected MissingParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_data_columns_array() {
        let err = expect_err(json!({
            "taskType": "create",
            "csvData": "a,b\n1,2",
            "chartType": "bar",
            "options": { "labelColumn": "a", "dataColumns": [] }
        }));
        match err {
            TaskError::MissingParameter(msg) => assert!(msg.contains("dataColumns"), "{msg}"),
            other => panic!("expected MissingParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_label_column() {
        let err = expect_err(json!({
            "taskType": "create",
            "csvData": "a,b\n1,2",
            "chartType": "bar",
            "options": { "labelColumn": "c", "dataColumns": ["b"] }
        }));
        match err {
            TaskError::InvalidParameter(msg) => {
                assert!(msg.contains("'c'"), "{msg}");
                assert!(msg.contains("not found"), "{msg}");
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_data_column() {
        let err = expect_err(json!({
            "taskType": "create",
            "csvData": "a,b\n1,2",
            "chartType": "bar",
            "options": { "labelColumn": "a", "dataColumns": ["b", "nope"] }
        }));
        match err {
            TaskError::InvalidParameter(msg) => assert!(msg.contains("'nope'"), "{msg}"),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_data_column_entry() {
        let err = expect_err(json!({
            "taskType": "create",
            "csvData": "a,b\n1,2",
            "chartType": "bar",
            "options": { "labelColumn": "a", "dataColumns": [7] }
        }));
        assert!(matches!(err, TaskError::InvalidParameter(_)));
    }

    #[test]
    fn test_create_outcome_is_data_uri() {
        let outcome = run_task(&json!({
            "taskType": "create",
            "csvData": "a,b\n1,2\n3,4",
            "chartType": "bar",
            "options": { "labelColumn": "a", "dataColumns": ["b"], "title": "T" }
        }))
        .unwrap();
        match outcome {
            TaskOutcome::Chart(uri) => assert!(uri.starts_with("data:image/png;base64,")),
            other => panic!("expected chart, got {other:?}"),
        }
    }
}
