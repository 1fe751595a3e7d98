//! Chat service orchestrating session lifecycle and message persistence.
//!
//! ChatService coordinates the ChatRepository, the context assembler and
//! the LLM provider for each incoming message:
//!
//! validate -> lock session -> lookup -> (title for new sessions)
//! -> context -> reply -> persist exchange -> respond.

use chrono::Utc;
use parley_types::chat::{ContextWindow, Session, StoredMessage};
use parley_types::error::ChatError;
use parley_types::llm::CompletionRequest;
use tracing::{info, warn};

use crate::chat::context::build_context;
use crate::chat::lock::SessionLocks;
use crate::chat::repository::{ChatRepository, Exchange};
use crate::chat::title::generate_title;
use crate::llm::box_provider::BoxLlmProvider;

/// Orchestrates chat session lifecycle and message persistence.
///
/// Generic over `ChatRepository` to maintain clean architecture
/// (parley-core never depends on parley-infra).
pub struct ChatService<C: ChatRepository> {
    chat_repo: C,
    provider: BoxLlmProvider,
    model: String,
    context_window: ContextWindow,
    locks: SessionLocks,
}

impl<C: ChatRepository> ChatService<C> {
    /// Create a new chat service. An empty `model` defers to the
    /// provider's configured default.
    pub fn new(chat_repo: C, provider: BoxLlmProvider, model: impl Into<String>) -> Self {
        Self {
            chat_repo,
            provider,
            model: model.into(),
            context_window: ContextWindow::default(),
            locks: SessionLocks::new(),
        }
    }

    /// Override how many prior messages are replayed to the model.
    pub fn with_context_window(mut self, window: ContextWindow) -> Self {
        self.context_window = window;
        self
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    /// Handle one user message and return the model's reply.
    ///
    /// A session that does not exist yet gets a generated title. The
    /// session row is written together with the first exchange, only
    /// after the reply succeeded, so a failed first request leaves
    /// nothing behind.
    #[tracing::instrument(name = "send_message", skip(self, session_id, message), fields(session_id = %session_id))]
    pub async fn send_message(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        validate(session_id, message)?;

        let _guard = self.locks.acquire(session_id).await;

        let new_session = match self.chat_repo.get_session(session_id).await? {
            Some(_) => None,
            None => {
                let title = generate_title(&self.provider, message, &self.model)
                    .await
                    .inspect_err(|e| warn!(error = %e, "Title generation failed"))?;
                info!(title = %title, "Generated title for new session");
                Some(Session {
                    session_id: session_id.to_string(),
                    title,
                    created_at: Utc::now(),
                })
            }
        };

        let context =
            build_context(&self.chat_repo, session_id, message, self.context_window).await?;

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: context,
            temperature: None,
            max_tokens: None,
        };

        let response = self
            .provider
            .complete(&request)
            .await
            .inspect_err(|e| warn!(error = %e, "Reply generation failed"))?;

        let exchange = Exchange {
            new_session: new_session.as_ref(),
            session_id,
            user_message: message,
            assistant_reply: &response.content,
        };

        let (user, assistant) = self
            .chat_repo
            .record_exchange(&exchange)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to persist exchange"))?;

        info!(
            user_message_id = user.id,
            assistant_message_id = assistant.id,
            created_session = new_session.is_some(),
            "Exchange recorded"
        );

        Ok(response.content)
    }

    /// List every session, oldest first.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, ChatError> {
        Ok(self.chat_repo.list_sessions().await?)
    }

    /// Full message history of a session; empty for unknown ids.
    pub async fn history(&self, session_id: &str) -> Result<Vec<StoredMessage>, ChatError> {
        Ok(self.chat_repo.get_history(session_id).await?)
    }
}

fn validate(session_id: &str, message: &str) -> Result<(), ChatError> {
    if session_id.is_empty() || message.is_empty() {
        return Err(ChatError::InvalidRequest(
            "session_id and message required".to_string(),
        ));
    }
    Ok(())
}
