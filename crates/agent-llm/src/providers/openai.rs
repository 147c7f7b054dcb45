//! OpenAI provider implementation
//!
//! This module implements the LLMProvider trait for the OpenAI chat
//! completions API and any server that speaks it (LM Studio, vLLM,
//! llama.cpp server).
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! # Examples
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, Message, LLMProvider};
//! use agent_llm::providers::{OpenAIProvider, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Local OpenAI-compatible server, no key required
//!     let config = OpenAIConfig::new("not-needed")
//!         .with_api_base("http://localhost:1234/v1")
//!         .with_timeout(60);
//!     let provider = OpenAIProvider::with_config(config)?;
//!
//!     let request = CompletionRequest::builder("qwen2.5-7b-instruct")
//!         .add_message(Message::user("Summarize the outlook for AAPL"))
//!         .max_tokens(256)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.message.text());
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication (may be empty for local servers)
    pub api_key: String,

    /// Base URL for the API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Optional list of supported models
    /// If None, any model string is accepted
    pub supported_models: Option<Vec<String>>,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables, requiring `OPENAI_API_KEY`
    ///
    /// Optionally reads base URL from `OPENAI_API_BASE` if set.
    pub fn from_env() -> Result<Self> {
        let api_key = agent_utils::env_opt("OPENAI_API_KEY").ok_or_else(|| {
            LLMError::ConfigurationError("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self {
            api_key,
            ..Self::from_env_lenient()
        })
    }

    /// Create config from environment variables, tolerating a missing key
    ///
    /// Local OpenAI-compatible servers usually ignore authentication.
    pub fn from_env_lenient() -> Self {
        Self {
            api_key: agent_utils::env_opt("OPENAI_API_KEY").unwrap_or_default(),
            api_base: agent_utils::env_or("OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE),
            ..Default::default()
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set supported models list
    pub fn with_supported_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = Some(models);
        self
    }

    /// Add a single supported model
    pub fn add_supported_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        match &mut self.supported_models {
            Some(models) => models.push(model),
            None => self.supported_models = Some(vec![model]),
        }
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            supported_models: None,
        }
    }
}

/// OpenAI provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new OpenAI provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Validate model name against supported models list (if configured)
    fn validate_model(&self, model: &str) -> Result<()> {
        if let Some(supported) = &self.config.supported_models {
            if !supported.iter().any(|m| m == model) {
                return Err(LLMError::InvalidRequest(format!(
                    "Model '{model}' is not in the supported models list: {supported:?}"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to OpenAI API at {}", self.config.api_base);

        self.validate_model(&request.model)?;

        let model = request.model.clone();
        let openai_request = OpenAIRequest::from(request);

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Content-Type", "application/json");
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }
        let response = builder.json(&openai_request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(map_status(status, error_text, &model));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        openai_response.into_completion()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// OpenAI-specific request/response types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

impl From<CompletionRequest> for OpenAIRequest {
    fn from(request: CompletionRequest) -> Self {
        // System prompt goes into the messages array for OpenAI
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system {
            messages.push(OpenAIMessage {
                role: "system",
                content: system,
            });
        }
        messages.extend(request.messages.into_iter().map(|m| OpenAIMessage {
            role: m.role.as_str(),
            content: m.content,
        }));

        Self {
            model: request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop_sequences,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl OpenAIResponse {
    fn into_completion(self) -> Result<CompletionResponse> {
        // OpenAI can return multiple choices; the first is used
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        debug!(
            "Received response - finish_reason: {:?}, tokens: {}/{}",
            choice.finish_reason, self.usage.prompt_tokens, self.usage.completion_tokens
        );

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            stop_reason: map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop")),
            usage: TokenUsage {
                input_tokens: self.usage.prompt_tokens,
                output_tokens: self.usage.completion_tokens,
            },
        })
    }
}

/// Map OpenAI stop reason to our format
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => {
            debug!("Content filtered by OpenAI safety systems");
            StopReason::EndTurn
        }
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

/// Map a non-success HTTP status onto an error
fn map_status(status: StatusCode, body: String, model: &str) -> LLMError {
    match status {
        StatusCode::UNAUTHORIZED => LLMError::AuthenticationFailed,
        StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimitExceeded(body),
        StatusCode::BAD_REQUEST => LLMError::InvalidRequest(body),
        StatusCode::NOT_FOUND => LLMError::ModelNotFound(model.to_string()),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}
