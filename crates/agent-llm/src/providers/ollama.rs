//! Ollama provider implementation
//!
//! Talks to a local Ollama server through its chat endpoint with streaming
//! disabled. See: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Server base URL, including the port
    pub host: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Read `OLLAMA_HOST`, falling back to `http://localhost:11434`
    ///
    /// A host without a scheme (`127.0.0.1:11434`, as the Ollama CLI accepts)
    /// is given `http://`.
    pub fn from_env() -> Self {
        let host = agent_utils::env_opt("OLLAMA_HOST")
            .map_or_else(|| DEFAULT_OLLAMA_HOST.to_string(), |h| normalize_host(&h));
        Self {
            host,
            ..Default::default()
        }
    }

    /// Set the server base URL
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = normalize_host(&host.into());
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Ollama provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a provider for the local default server
    pub fn localhost() -> Result<Self> {
        Self::with_config(OllamaConfig::default())
    }

    /// Get the current configuration
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    #[instrument(skip(self, request), fields(model = %request.model, host = %self.config.host))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Ollama at {}", self.config.host);

        let ollama_request = OllamaRequest::from_request(&request);

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.host))
            .json(&ollama_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(map_status(status, error_text, &request.model));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        debug!(
            "Received response - done_reason: {:?}, tokens: {}/{}",
            ollama_response.done_reason,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        Ok(CompletionResponse {
            message: Message::assistant(ollama_response.message.content),
            stop_reason: match ollama_response.done_reason.as_deref() {
                Some("length") => StopReason::MaxTokens,
                _ => StopReason::EndTurn,
            },
            usage: TokenUsage {
                input_tokens: ollama_response.prompt_eval_count,
                output_tokens: ollama_response.eval_count,
            },
        })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

// Ollama-specific request/response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

impl OllamaRequest {
    fn from_request(request: &CompletionRequest) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(OllamaMessage {
                role: Role::System.as_str().to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| OllamaMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));

        Self {
            model: request.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
                stop: request.stop_sequences.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

/// Map a non-success HTTP status onto an error
///
/// A bare Ollama server only answers 400 and 404; the rest come from
/// authenticating proxies in front of it.
fn map_status(status: StatusCode, body: String, model: &str) -> LLMError {
    match status {
        StatusCode::UNAUTHORIZED => LLMError::AuthenticationFailed,
        StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimitExceeded(body),
        StatusCode::BAD_REQUEST => LLMError::InvalidRequest(body),
        StatusCode::NOT_FOUND => LLMError::ModelNotFound(model.to_string()),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}
