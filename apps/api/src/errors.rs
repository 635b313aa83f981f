use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A schema failed pre-commit validation. Fail-closed: the previously
    /// accepted schema stays in effect and the caller gets the full error
    /// list.
    #[error("Schema rejected with {} validation error(s)", .0.len())]
    SchemaRejected(Vec<String>),

    /// A base section id vanished from a merge without explicit removal
    /// authorization. Indicates a producer malfunction or a removal-extractor
    /// false positive; must never be swallowed.
    #[error("Preservation violation: {0}")]
    Preservation(String),

    #[error("Producer error: {0}")]
    Producer(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps artifact-store failures onto the storage variant.
    pub fn storage(e: anyhow::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::SchemaRejected(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "SCHEMA_REJECTED",
                "Schema failed validation and was not committed".to_string(),
                Some(errors.clone()),
            ),
            AppError::Preservation(msg) => {
                tracing::error!("Preservation violation: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PRESERVATION_VIOLATION",
                    msg.clone(),
                    None,
                )
            }
            AppError::Producer(msg) => {
                tracing::error!("Producer error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PRODUCER_ERROR",
                    "The schema producer failed".to_string(),
                    None,
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "An artifact storage error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "details": details,
            }
        }));

        (status, body).into_response()
    }
}
