//! Language-model substrate for invest-crew
//!
//! This crate provides provider-agnostic abstractions for text completion:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Provider trait for LLM implementations
//! - `ModelSpec` parsing of `<backend>/<model>` identifiers
//! - Ollama, OpenAI-compatible and Anthropic providers

pub mod completion;
pub mod error;
pub mod messages;
pub mod model;
pub mod provider;
pub mod providers;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use model::{Backend, DEFAULT_MODEL, ModelSpec, provider_for};
pub use provider::LLMProvider;
