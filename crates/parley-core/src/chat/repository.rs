//! ChatRepository trait definition.
//!
//! Provides create/read/append operations for sessions and their messages.
//! Absence is modelled as `Ok(None)` / an empty `Vec`, never as an error.

use chrono::{DateTime, Utc};
use parley_types::chat::{MessageRole, Session, StoredMessage};
use parley_types::error::RepositoryError;

/// One completed user/assistant turn, written atomically.
///
/// Each message is stamped when it is inserted.
///
/// When `new_session` is set, the session row is inserted in the same
/// transaction as the two messages, so a session never exists without its
/// first exchange.
#[derive(Debug, Clone)]
pub struct Exchange<'a> {
    pub new_session: Option<&'a Session>,
    pub session_id: &'a str,
    pub user_message: &'a str,
    pub assistant_reply: &'a str,
}

/// Repository trait for chat session and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Every write is committed before the returned future resolves.
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Create a new chat session.
    ///
    /// Fails with `RepositoryError::DuplicateSession` if the id is taken;
    /// an existing title is never overwritten.
    fn create_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<Session, RepositoryError>> + Send;

    /// Get a chat session by its id.
    fn get_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// List all sessions, ordered by created_at ASC.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Session>, RepositoryError>> + Send;

    /// Append a message to a session, assigning the next sequence id.
    fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<StoredMessage, RepositoryError>> + Send;

    /// Get every message of a session, ordered by id ASC.
    fn get_history(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;

    /// Get the last `limit` messages of a session, ordered by id ASC.
    fn get_recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, RepositoryError>> + Send;

    /// Persist a full exchange (and optionally its new session) atomically.
    ///
    /// Returns the stored user and assistant messages, in that order.
    fn record_exchange(
        &self,
        exchange: &Exchange<'_>,
    ) -> impl std::future::Future<Output = Result<(StoredMessage, StoredMessage), RepositoryError>>
    + Send;
}
