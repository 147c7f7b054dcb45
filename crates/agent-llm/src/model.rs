//! Model identifiers of the form `<backend>/<model>`
//!
//! `ollama/gemma2:latest` selects the `gemma2:latest` model on a local Ollama
//! server. A bare model name is treated as an Ollama model.

use crate::{LLMError, LLMProvider, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default model used when none is configured
pub const DEFAULT_MODEL: &str = "ollama/gemma2:latest";

/// Inference backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local Ollama server
    Ollama,
    /// OpenAI or any OpenAI-compatible server
    OpenAI,
    /// Anthropic Messages API
    Anthropic,
}

impl Backend {
    /// Prefix used in model identifiers
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

/// Parsed model identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelSpec {
    backend: Backend,
    model: String,
}

impl ModelSpec {
    /// Create a spec from parts
    pub fn new(backend: Backend, model: impl Into<String>) -> Result<Self> {
        let model = model.into().trim().to_string();
        if model.is_empty() {
            return Err(LLMError::ConfigurationError(
                "model name must not be empty".to_string(),
            ));
        }
        Ok(Self { backend, model })
    }

    /// Inference backend
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Backend-specific model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            backend: Backend::Ollama,
            model: "gemma2:latest".to_string(),
        }
    }
}

impl FromStr for ModelSpec {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let Some((prefix, model)) = s.split_once('/') else {
            return Self::new(Backend::Ollama, s);
        };

        let backend = match prefix.to_ascii_lowercase().as_str() {
            "ollama" => Backend::Ollama,
            "openai" => Backend::OpenAI,
            "anthropic" => Backend::Anthropic,
            other => {
                return Err(LLMError::ConfigurationError(format!(
                    "unknown model backend '{other}' in '{s}' (expected ollama, openai or anthropic)"
                )));
            }
        };
        Self::new(backend, model)
    }
}

impl TryFrom<String> for ModelSpec {
    type Error = LLMError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ModelSpec> for String {
    fn from(spec: ModelSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.backend.as_str(), self.model)
    }
}

/// Build a provider for `spec`, reading endpoints and keys from the environment
///
/// - Ollama: `OLLAMA_HOST` (default `http://localhost:11434`)
/// - OpenAI: `OPENAI_API_KEY` (optional for local servers), `OPENAI_API_BASE`
/// - Anthropic: `ANTHROPIC_API_KEY`
pub fn provider_for(spec: &ModelSpec, timeout_secs: u64) -> Result<Arc<dyn LLMProvider>> {
    use crate::providers::{
        AnthropicProvider, OllamaConfig, OllamaProvider, OpenAIConfig, OpenAIProvider,
    };

    let provider: Arc<dyn LLMProvider> = match spec.backend() {
        Backend::Ollama => Arc::new(OllamaProvider::with_config(
            OllamaConfig::from_env().with_timeout(timeout_secs),
        )?),
        Backend::OpenAI => Arc::new(OpenAIProvider::with_config(
            OpenAIConfig::from_env_lenient().with_timeout(timeout_secs),
        )?),
        Backend::Anthropic => Arc::new(AnthropicProvider::from_env()?),
    };
    Ok(provider)
}
