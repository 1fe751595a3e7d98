//! Chat session and message types for Parley.
//!
//! A session is a conversation keyed by a caller-supplied id; messages are
//! the user/assistant turns stored under it in arrival order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Default number of prior messages sent to the model with each new input.
pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

/// A chat session.
///
/// Created once, on the first successful exchange for its `session_id`.
/// The title is generated from that first user message and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// A message persisted within a session.
///
/// `id` is assigned by storage and strictly increases, so it defines the
/// order of the conversation. Stored messages are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// How many prior messages are replayed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextWindow(usize);

impl ContextWindow {
    pub fn new(size: usize) -> Self {
        Self(size)
    }

    pub fn size(&self) -> usize {
        self.0
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self(DEFAULT_CONTEXT_WINDOW)
    }
}
