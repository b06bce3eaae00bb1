use assessment_core::{EngineError, ValidationError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Every way a request can fail at the HTTP boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Detail is logged with an error id and never returned to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(e) => AppError::Validation(e),
            EngineError::UnsupportedLanguage(e) => AppError::UnsupportedLanguage(e.code),
            EngineError::Assessment(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": e.to_string() }),
            ),
            AppError::UnsupportedLanguage(code) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("unsupported language: {}", code) }),
            ),
            AppError::MalformedBody(detail) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("malformed request body: {}", detail) }),
            ),
            AppError::Internal(detail) => {
                let error_id = Uuid::new_v4().to_string();
                tracing::error!(error_id = %error_id, "Assessment request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal error", "error_id": error_id }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
