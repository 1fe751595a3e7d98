//! Chat HTTP handler.
//!
//! Endpoint:
//! - POST /chat - Send one message to a session and receive the reply

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for POST /chat. Absent fields are rejected by the service.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /chat - Run one turn of the conversation.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;
    let session_id = request.session_id.unwrap_or_default();
    let message = request.message.unwrap_or_default();

    let reply = state
        .chat_service
        .send_message(&session_id, &message)
        .await?;

    Ok(Json(ChatResponse { reply }))
}
