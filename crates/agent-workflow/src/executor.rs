//! Analyzer execution: the seam between the orchestrator and the model substrate

use crate::prompt::{self, CapabilityData};
use crate::{Analyzer, StageInput};
use agent_core::{Context, Error, Result};
use agent_llm::{CompletionRequest, LLMProvider, Message, StopReason};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs one analyzer over one stage's input and returns the generated text
///
/// The orchestrator only sees this trait, so tests can substitute a
/// deterministic implementation for the language model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyzerExecutor: Send + Sync {
    /// Produce the stage result
    async fn execute(&self, analyzer: &Analyzer, input: &StageInput, ctx: &Context)
    -> Result<String>;
}

/// Configuration for LLM-backed execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Backend-specific model name
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            model: "gemma2:latest".to_string(),
            max_tokens: 4096,
            temperature: Some(0.2),
        }
    }
}

/// Executor that gathers capability data and asks a language model for the result
///
/// Every capability of the analyzer is invoked for the run's symbol, in
/// declared order, before a single completion call. Any capability failure
/// aborts the stage.
pub struct LlmExecutor {
    provider: Arc<dyn LLMProvider>,
    config: ExecutorConfig,
}

impl LlmExecutor {
    /// Create a new executor
    pub fn new(provider: Arc<dyn LLMProvider>, config: ExecutorConfig) -> Self {
        Self { provider, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    async fn gather(&self, analyzer: &Analyzer, symbol: &str) -> Result<Vec<CapabilityData>> {
        let mut gathered = Vec::with_capacity(analyzer.capabilities().len());
        for capability in analyzer.capabilities() {
            debug!(capability = capability.name(), symbol, "Invoking capability");
            let value = capability.invoke(symbol).await?;
            let data = serde_json::to_string_pretty(&value)
                .map_err(|e| Error::Configuration(format!("Failed to encode capability data: {e}")))?;
            gathered.push(CapabilityData {
                name: capability.name().to_string(),
                description: capability.description().to_string(),
                data,
            });
        }
        Ok(gathered)
    }
}

#[async_trait]
impl AnalyzerExecutor for LlmExecutor {
    async fn execute(
        &self,
        analyzer: &Analyzer,
        input: &StageInput,
        ctx: &Context,
    ) -> Result<String> {
        let symbol = ctx
            .symbol()
            .ok_or_else(|| Error::Configuration("context has no symbol".to_string()))?;

        let capabilities = self.gather(analyzer, symbol).await?;

        let system = prompt::render_system(analyzer, ctx.language())?;
        let user = prompt::render_user(symbol, input, &capabilities)?;

        let mut request = CompletionRequest::builder(&self.config.model)
            .system(system)
            .add_message(Message::user(user))
            .max_tokens(self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            request = request.temperature(temperature);
        }

        info!(
            role = analyzer.role(),
            provider = self.provider.name(),
            model = %self.config.model,
            "Requesting completion"
        );
        let response = self.provider.complete(request.build()).await?;

        debug!(
            "LLM response - stop_reason: {:?}, tokens: {}",
            response.stop_reason,
            response.usage.total()
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!(role = analyzer.role(), "Completion truncated at max tokens");
        }

        if response.message.is_blank() {
            return Err(Error::Model(format!(
                "'{}' returned an empty completion",
                self.config.model
            )));
        }
        Ok(response.message.content)
    }
}
