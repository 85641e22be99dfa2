use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No attempts left ({attempts_left} remaining)")]
    AttemptsExhausted { attempts_left: i32 },

    #[error("No quiz session registered for quiz '{0}'")]
    NoSession(String),

    #[error("Module data missing at index {0}")]
    MissingModuleData(usize),

    #[error("Intent rejected: {0}")]
    InvalidIntent(String),

    #[error("Invalid question bank: {0}")]
    InvalidQuestionBank(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, code, error_message) = match self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Error::AttemptsExhausted { .. } => (
                StatusCode::FORBIDDEN,
                "attempts_exhausted",
                "No attempts left for this quiz".to_string(),
            ),
            Error::NoSession(quiz_id) => (
                StatusCode::FORBIDDEN,
                "no_session",
                format!("Register for quiz '{}' before starting", quiz_id),
            ),
            Error::InvalidIntent(msg) => (StatusCode::CONFLICT, "invalid_intent", msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, "validation", err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json", err.to_string()),
            Error::InvalidQuestionBank(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_question_bank", msg)
            }
            Error::MissingModuleData(idx) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "missing_module_data",
                format!("Module data missing at index {}", idx),
            ),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, "io", err.to_string()),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "error": code, "message": error_message }));
        (status, body).into_response()
    }
}
