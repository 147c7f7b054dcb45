//! Concrete LLM provider implementations

pub mod anthropic;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use openai::{OpenAIConfig, OpenAIProvider};
