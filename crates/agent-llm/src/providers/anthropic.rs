//! Anthropic Claude provider implementation
//!
//! This module implements the LLMProvider trait for Anthropic's Claude models.
//! See: https://docs.anthropic.com/en/api/messages

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self { client, api_key })
    }

    /// Create a provider from environment variable
    ///
    /// Reads the API key from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = agent_utils::env_opt("ANTHROPIC_API_KEY").ok_or_else(|| {
            LLMError::ConfigurationError(
                "ANTHROPIC_API_KEY environment variable not set".to_string(),
            )
        })?;
        Self::new(api_key)
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Anthropic API");

        let anthropic_request = AnthropicRequest::from(request);

        let response = self
            .client
            .post(format!("{ANTHROPIC_API_BASE}/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(map_status(status, error_text, &anthropic_request.model));
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        debug!(
            "Received response - stop_reason: {}, tokens: {}/{}",
            anthropic_response.stop_reason,
            anthropic_response.usage.input_tokens,
            anthropic_response.usage.output_tokens
        );

        Ok(anthropic_response.into_completion())
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// Anthropic-specific request/response types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

impl From<CompletionRequest> for AnthropicRequest {
    fn from(request: CompletionRequest) -> Self {
        // The Messages API only accepts user/assistant turns; system text is a top-level field.
        let mut system = request.system;
        let mut messages = Vec::with_capacity(request.messages.len());
        for message in request.messages {
            if message.role == Role::System {
                system = Some(match system {
                    Some(existing) => format!("{existing}\n\n{}", message.content),
                    None => message.content,
                });
            } else {
                messages.push(message);
            }
        }

        Self {
            model: request.model,
            messages,
            system,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop_sequences: request.stop_sequences,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
    stop_reason: String,
    usage: UsageResponse,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    input_tokens: usize,
    output_tokens: usize,
}

impl AnthropicResponse {
    fn into_completion(self) -> CompletionResponse {
        let text = self
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n");

        CompletionResponse {
            message: Message::assistant(text),
            stop_reason: match self.stop_reason.as_str() {
                "end_turn" => StopReason::EndTurn,
                "max_tokens" => StopReason::MaxTokens,
                "stop_sequence" => StopReason::StopSequence,
                other => {
                    debug!("Unknown stop reason: {}", other);
                    StopReason::EndTurn
                }
            },
            usage: TokenUsage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
        }
    }
}

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
