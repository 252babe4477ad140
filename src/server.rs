//! HTTP surface: a single POST task endpoint plus envelope shaping.

use crate::error::TaskError;
use crate::task::{self, TaskOutcome};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value as JsonValue;

pub const TASK_PATH: &str = "/api/tasks/send";

#[derive(Debug, Serialize)]
struct ResultSchema {
    #[serde(rename = "type")]
    media_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct SuccessEnvelope {
    status: &'static str,
    message: &'static str,
    result_schema: ResultSchema,
    result_reference: JsonValue,
}

#[derive(Debug, Serialize)]
struct FailureEnvelope {
    status: &'static str,
    error: FailureDetail,
}

#[derive(Debug, Serialize)]
struct FailureDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let envelope = FailureEnvelope {
            status: "failed",
            error: FailureDetail {
                code: self.code(),
                message: self.to_string(),
            },
        };
        let mut response = (self.status(), Json(envelope)).into_response();
        if matches!(self, TaskError::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

/// Build the application router.
pub fn router() -> Router {
    Router::new().route(TASK_PATH, post(handle_task).fallback(method_not_allowed))
}

/// Handle one task request end to end; every path produces exactly one
/// response.
async fn handle_task(body: String) -> Response {
    let payload: JsonValue = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => {
            let err = TaskError::BadRequest("Invalid or missing JSON payload.".to_string());
            tracing::warn!(code = err.code(), "rejected unparsable payload");
            return err.into_response();
        }
    };

    match task::run_task(&payload) {
        Ok(outcome) => success_response(outcome),
        Err(err) => {
            if err.status().is_server_error() {
                tracing::error!(code = err.code(), message = %err, "task failed");
            } else {
                tracing::warn!(code = err.code(), message = %err, "task rejected");
            }
            err.into_response()
        }
    }
}

async fn method_not_allowed(method: Method) -> Response {
    TaskError::MethodNotAllowed(format!(
        "Method {method} Not Allowed. Only POST is supported."
    ))
    .into_response()
}

fn success_response(outcome: TaskOutcome) -> Response {
    let envelope = match outcome {
        TaskOutcome::Analysis(analysis) => {
            let result_reference = match serde_json::to_value(&analysis) {
                Ok(value) => value,
                Err(e) => {
                    return TaskError::Internal(format!(
                        "Failed to serialize analysis result: {e}"
                    ))
                    .into_response()
                }
            };
            SuccessEnvelope {
                status: "completed",
                message: "Data analysis complete.",
                result_schema: ResultSchema {
                    media_type: "application/json",
                    encoding: None,
                },
                result_reference,
            }
        }
        TaskOutcome::Chart(data_uri) => SuccessEnvelope {
            status: "completed",
            message: "Chart created successfully.",
            result_schema: ResultSchema {
                media_type: "image/png",
                encoding: Some("base64"),
            },
            result_reference: JsonValue::String(data_uri),
        },
    };

    (StatusCode::OK, Json(envelope)).into_response()
}
