//! Application error type mapping to HTTP status codes and `{"error": ...}` bodies.
//!
//! Clients only ever see fixed messages. Underlying model and storage
//! errors are logged here and not echoed back.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use parley_types::error::{ChatError, RepositoryError};
use parley_types::llm::LlmError;

const REQUIRED_FIELDS: &str = "session_id and message required";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Missing, empty or unparseable request fields.
    InvalidRequest(String),
    /// The model backend did not produce a reply.
    ModelUnavailable(LlmError),
    /// The database failed.
    Storage(RepositoryError),
    /// The request body could not be read at all.
    UnreadableBody(StatusCode),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::InvalidRequest(msg) => AppError::InvalidRequest(msg),
            ChatError::ModelUnavailable(e) => AppError::ModelUnavailable(e),
            ChatError::StorageUnavailable(e) => AppError::Storage(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        match rejection {
            JsonRejection::JsonDataError(_)
            | JsonRejection::JsonSyntaxError(_)
            | JsonRejection::MissingJsonContentType(_) => {
                AppError::InvalidRequest(REQUIRED_FIELDS.to_string())
            }
            other => AppError::UnreadableBody(other.status()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ModelUnavailable(e) => {
                tracing::error!(error = %e, "Model call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM not responding".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!(error = %e, "Storage operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage unavailable".to_string(),
                )
            }
            AppError::UnreadableBody(status) => {
                (*status, "request body could not be read".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
