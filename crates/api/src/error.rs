//! Application-level error type for HTTP handlers.
//!
//! Wraps the domain and infrastructure errors and implements
//! [`IntoResponse`] to produce consistent `{ "error", "code" }` JSON
//! bodies. Store and queue failures are transient infrastructure
//! conditions and map to 500 with sanitized messages; they are never
//! confused with `NotFound`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use finsight_core::error::CoreError;
use finsight_db::StoreError;
use finsight_queue::QueueError;

/// Error type returned by all handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `finsight_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A job store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A queue transport failure.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Storage(msg) => {
                    tracing::error!(error = %msg, "Artifact storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_ERROR",
                        "Could not store the uploaded document".to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::Store(err) => {
                tracing::error!(error = %err, "Job store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "The job store is temporarily unavailable".to_string(),
                )
            }

            AppError::Queue(err) => {
                tracing::error!(error = %err, "Queue transport error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "QUEUE_ERROR",
                    "The dispatch queue is temporarily unavailable".to_string(),
                )
            }

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
