//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Implementations give access to one inference backend (Ollama, an
/// OpenAI-compatible server, Anthropic). Each pipeline run owns its provider.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "ollama", "openai")
    fn name(&self) -> &str;
}
