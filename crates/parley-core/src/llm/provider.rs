//! LlmProvider trait definition.
//!
//! This is the core abstraction that the model backend implements.
//! Uses RPITIT for `complete`; see `BoxLlmProvider` for dynamic dispatch.

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Ollama, test doubles, ...).
///
/// Calls are unary: one request in, one full response out. The orchestrator
/// awaits the result and never cancels an in-flight call itself.
///
/// Implementations live in parley-infra (e.g., `OllamaProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
