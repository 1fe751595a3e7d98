//! Session title generation via LLM.
//!
//! `generate_title` asks the model for a short label for a new session,
//! based solely on the first user message.

use parley_types::llm::{CompletionRequest, LlmError, Message};

use crate::llm::box_provider::BoxLlmProvider;

/// System prompt for the title generation LLM call.
const TITLE_SYSTEM_PROMPT: &str = "Generate a concise 3–5 word title based on user input. \
No punctuation. No quotes. Strictly answer with only the title.";

/// Number of words taken from the user message when the model returns
/// an empty title.
const FALLBACK_TITLE_WORDS: usize = 5;

/// Build the two-message title prompt: fixed instruction + raw user input.
pub fn title_prompt(first_user_message: &str) -> Vec<Message> {
    vec![
        Message::system(TITLE_SYSTEM_PROMPT),
        Message::user(first_user_message),
    ]
}

/// Generate a session title from the first user message.
///
/// The result is trimmed of whitespace and surrounding quotes. A blank
/// answer falls back to the first few words of the message.
#[tracing::instrument(
    name = "generate_title",
    skip(provider, first_user_message),
    fields(provider = %provider.name())
)]
pub async fn generate_title(
    provider: &BoxLlmProvider,
    first_user_message: &str,
    model: &str,
) -> Result<String, LlmError> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages: title_prompt(first_user_message),
        temperature: Some(0.3),
        max_tokens: Some(32),
    };

    let response = provider.complete(&request).await?;

    let title = clean_title(&response.content);
    if title.is_empty() {
        tracing::warn!("Model returned an empty title, deriving one from the message");
        return Ok(fallback_title(first_user_message));
    }

    Ok(title)
}

fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim()
        .to_string()
}

fn fallback_title(message: &str) -> String {
    message
        .split_whitespace()
        .take(FALLBACK_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}
