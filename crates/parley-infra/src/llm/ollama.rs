//! Ollama LLM provider implementation.
//!
//! Talks to an Ollama server through its non-streaming chat endpoint
//! (`POST {base_url}/api/chat` with `"stream": false`). System turns are sent
//! inline as `role: "system"` messages, exactly as they appear in the request.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use parley_core::llm::provider::LlmProvider;
use parley_types::config::ModelConfig;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

/// Provider for a local or remote Ollama server.
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "OllamaOptions::is_empty")]
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl OllamaOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_predict.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: Option<String>,
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl OllamaProvider {
    /// Create a provider for `base_url` (trailing slash tolerated) using
    /// `model` whenever a request leaves its model empty.
    ///
    /// Fails if the HTTP client cannot be built with the given timeout.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    /// Create from the `[model]` section of the global config.
    pub fn from_config(config: &ModelConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.base_url,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> OllamaChatRequest<'a> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };

        OllamaChatRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else if e.is_connect() {
        LlmError::Unreachable(e.to_string())
    } else {
        LlmError::Provider {
            message: e.to_string(),
        }
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_request(request);
        let url = format!("{}/api/chat", self.base_url);

        tracing::debug!(model = %body.model, messages = body.messages.len(), "Sending Ollama chat request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                message: format!("HTTP {}: {}", status.as_u16(), error_text),
            });
        }

        let result: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(e.to_string()))?;

        Ok(CompletionResponse {
            content: result.message.content,
            model: result.model.unwrap_or_else(|| body.model.to_string()),
            stop_reason: result.done_reason,
            usage: Usage {
                input_tokens: result.prompt_eval_count.unwrap_or(0),
                output_tokens: result.eval_count.unwrap_or(0),
            },
        })
    }
}
