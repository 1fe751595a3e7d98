//! Session HTTP handlers.
//!
//! Endpoints:
//! - GET /sessions             - List every session, oldest first
//! - GET /history/{session_id} - Messages of one session in insertion order

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use parley_types::chat::{MessageRole, Session, StoredMessage};

use crate::http::error::AppError;
use crate::state::AppState;

/// One entry of the GET /sessions listing.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionSummary {
    fn from(s: Session) -> Self {
        Self {
            session_id: s.session_id,
            title: s.title,
            created_at: s.created_at,
        }
    }
}

/// One entry of the GET /history/{session_id} listing.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<StoredMessage> for HistoryEntry {
    fn from(m: StoredMessage) -> Self {
        Self {
            role: m.role,
            content: m.content,
            timestamp: m.timestamp,
        }
    }
}

/// GET /sessions - List sessions.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let sessions = state.chat_service.list_sessions().await?;
    Ok(Json(sessions.into_iter().map(SessionSummary::from).collect()))
}

/// GET /history/{session_id} - Session history; empty for unknown ids.
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let messages = state.chat_service.history(&session_id).await?;
    Ok(Json(messages.into_iter().map(HistoryEntry::from).collect()))
}
