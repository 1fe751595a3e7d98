use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("session '{0}' already exists")]
    DuplicateSession(String),
}

/// Errors surfaced by the chat orchestrator.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing or empty request fields. User-correctable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The model backend failed; no retry is attempted.
    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] LlmError),

    /// Persistence failed; the request is abandoned.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] RepositoryError),
}
