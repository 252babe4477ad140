use axum::http::StatusCode;
use thiserror::Error;

/// Request processing failure, carrying the human-readable message.
///
/// Each variant maps to a stable machine-readable code and an HTTP status;
/// the envelope shaping lives in the server module.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    MethodNotAllowed(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    InvalidTaskType(String),
    #[error("{0}")]
    MissingInput(String),
    #[error("{0}")]
    InvalidCsvFormat(String),
    #[error("{0}")]
    EmptyData(String),
    #[error("{0}")]
    InvalidParameter(String),
    #[error("{0}")]
    MissingParameter(String),
    #[error("{0}")]
    ChartGenerationFailed(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    UnexpectedState(String),
}

impl TaskError {
    /// Stable machine-readable code for the failure envelope.
    pub fn code(&self) -> &'static str {
        match self {
            TaskError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            TaskError::BadRequest(_) => "BAD_REQUEST",
            TaskError::InvalidTaskType(_) => "INVALID_TASK_TYPE",
            TaskError::MissingInput(_) => "MISSING_INPUT",
            TaskError::InvalidCsvFormat(_) => "INVALID_CSV_FORMAT",
            TaskError::EmptyData(_) => "EMPTY_DATA",
            TaskError::InvalidParameter(_) => "INVALID_PARAMETER",
            TaskError::MissingParameter(_) => "MISSING_PARAMETER",
            TaskError::ChartGenerationFailed(_) => "CHART_GENERATION_FAILED",
            TaskError::Internal(_) => "INTERNAL_SERVER_ERROR",
            TaskError::UnexpectedState(_) => "UNEXPECTED_STATE",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            TaskError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            TaskError::BadRequest(_)
            | TaskError::InvalidTaskType(_)
            | TaskError::MissingInput(_)
            | TaskError::InvalidCsvFormat(_)
            | TaskError::EmptyData(_)
            | TaskError::InvalidParameter(_)
            | TaskError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            TaskError::ChartGenerationFailed(_)
            | TaskError::Internal(_)
            | TaskError::UnexpectedState(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
