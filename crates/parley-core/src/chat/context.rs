//! Context window assembly.
//!
//! The model sees the most recent persisted turns of a session, oldest
//! first, followed by the new user input. No summarization or relevance
//! ranking is applied: older turns simply fall out of the window.

use parley_types::chat::{ContextWindow, StoredMessage};
use parley_types::error::RepositoryError;
use parley_types::llm::Message;

use super::repository::ChatRepository;

/// Build the prompt for a new user input from already-loaded history.
///
/// `history` must be ordered by id ascending. Only its last
/// `window.size()` entries are kept. The result always ends with the new
/// input as a user message, verbatim.
pub fn assemble_context(
    history: &[StoredMessage],
    new_user_input: &str,
    window: ContextWindow,
) -> Vec<Message> {
    let skip = history.len().saturating_sub(window.size());

    let mut messages: Vec<Message> = history[skip..]
        .iter()
        .map(|m| Message {
            role: m.role,
            content: m.content.clone(),
        })
        .collect();

    messages.push(Message::user(new_user_input));
    messages
}

/// Load the recent turns of `session_id` and assemble the model prompt.
///
/// An unknown session yields just the new input.
pub async fn build_context<R: ChatRepository>(
    repo: &R,
    session_id: &str,
    new_user_input: &str,
    window: ContextWindow,
) -> Result<Vec<Message>, RepositoryError> {
    let recent = repo.get_recent_messages(session_id, window.size()).await?;
    tracing::debug!(
        session_id = %session_id,
        prior_messages = recent.len(),
        "Assembled context window"
    );
    Ok(assemble_context(&recent, new_user_input, window))
}
