//! Configuration for an analysis run

use crate::api::yahoo::HistoryRange;
use crate::error::{InvestError, Result};
use agent_llm::ModelSpec;
use agent_workflow::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything a run needs besides the symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestConfig {
    /// Language model, as `<backend>/<model>`
    pub model: ModelSpec,

    /// Max tokens per stage completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// HTTP timeout for model requests
    pub llm_timeout: Duration,

    /// Per-stage time budget
    pub stage_timeout: Option<Duration>,

    /// Stage scheduling
    pub execution_mode: ExecutionMode,

    /// Response language passed to every analyzer
    pub language: Option<String>,

    /// Alpha Vantage API key; fundamentals and sentiment are unavailable without it
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute (5 on the free tier)
    pub alpha_vantage_rpm: u32,

    /// Benchmark symbol for beta
    pub benchmark: String,

    /// Price history window for technical and risk metrics
    pub history_range: HistoryRange,

    /// Annual risk-free rate used for the Sharpe ratio
    pub risk_free_rate: f64,

    /// Cache TTL for price history
    pub cache_ttl_prices: Duration,

    /// Cache TTL for fundamental data
    pub cache_ttl_fundamentals: Duration,

    /// Cache TTL for news sentiment
    pub cache_ttl_news: Duration,
}

impl Default for InvestConfig {
    fn default() -> Self {
        Self {
            model: ModelSpec::default(),
            max_tokens: 4096,
            temperature: Some(0.2),
            llm_timeout: Duration::from_secs(300),
            stage_timeout: None,
            execution_mode: ExecutionMode::Sequential,
            language: None,
            alpha_vantage_api_key: None,
            alpha_vantage_rpm: 5,
            benchmark: "SPY".to_string(),
            history_range: HistoryRange::OneYear,
            risk_free_rate: 0.04,
            cache_ttl_prices: Duration::from_secs(900), // 15 minutes
            cache_ttl_fundamentals: Duration::from_secs(3600), // 1 hour
            cache_ttl_news: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl InvestConfig {
    /// Create a new configuration builder
    pub fn builder() -> InvestConfigBuilder {
        InvestConfigBuilder::default()
    }

    /// Defaults overridden by environment variables, then validated
    ///
    /// Reads `INVEST_MODEL`, `INVEST_STAGE_TIMEOUT_SECS`, `INVEST_BENCHMARK`,
    /// `INVEST_HISTORY_RANGE`, `INVEST_RISK_FREE_RATE`, `INVEST_LANGUAGE` and
    /// `ALPHA_VANTAGE_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(model) = agent_utils::env_opt("INVEST_MODEL") {
            config.model = model
                .parse()
                .map_err(|e: agent_llm::LLMError| InvestError::Config(e.to_string()))?;
        }
        if let Some(secs) = agent_utils::env_parse::<u64>("INVEST_STAGE_TIMEOUT_SECS")
            .map_err(InvestError::Config)?
        {
            config.stage_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(benchmark) = agent_utils::env_opt("INVEST_BENCHMARK") {
            config.benchmark = benchmark.to_uppercase();
        }
        if let Some(range) = agent_utils::env_parse::<HistoryRange>("INVEST_HISTORY_RANGE")
            .map_err(InvestError::Config)?
        {
            config.history_range = range;
        }
        if let Some(rate) =
            agent_utils::env_parse::<f64>("INVEST_RISK_FREE_RATE").map_err(InvestError::Config)?
        {
            config.risk_free_rate = rate;
        }
        config.language = agent_utils::env_opt("INVEST_LANGUAGE");
        config.alpha_vantage_api_key = agent_utils::env_opt("ALPHA_VANTAGE_API_KEY");

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(InvestError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(InvestError::Config(format!(
                    "temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }
        if self.stage_timeout.is_some_and(|d| d.is_zero()) {
            return Err(InvestError::Config(
                "stage timeout must be greater than 0".to_string(),
            ));
        }
        if self.alpha_vantage_rpm == 0 {
            return Err(InvestError::Config(
                "alpha_vantage_rpm must be greater than 0".to_string(),
            ));
        }
        if self.benchmark.trim().is_empty() {
            return Err(InvestError::Config(
                "benchmark symbol must not be empty".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(InvestError::Config(format!(
                "risk_free_rate must be within 0.0..1.0, got {}",
                self.risk_free_rate
            )));
        }
        Ok(())
    }
}

/// Builder for InvestConfig
#[derive(Debug, Default)]
pub struct InvestConfigBuilder {
    model: Option<ModelSpec>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    stage_timeout: Option<Duration>,
    execution_mode: Option<ExecutionMode>,
    language: Option<String>,
    alpha_vantage_api_key: Option<String>,
    alpha_vantage_rpm: Option<u32>,
    benchmark: Option<String>,
    history_range: Option<HistoryRange>,
    risk_free_rate: Option<f64>,
}

impl InvestConfigBuilder {
    /// Set the model
    pub fn model(mut self, model: ModelSpec) -> Self {
        self.model = Some(model);
        self
    }

    /// Set max tokens per completion
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the per-stage time budget
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    /// Set the execution mode
    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = Some(mode);
        self
    }

    /// Set the response language
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set Alpha Vantage requests per minute
    pub fn alpha_vantage_rpm(mut self, rpm: u32) -> Self {
        self.alpha_vantage_rpm = Some(rpm);
        self
    }

    /// Set the benchmark symbol
    pub fn benchmark(mut self, symbol: impl Into<String>) -> Self {
        self.benchmark = Some(symbol.into());
        self
    }

    /// Set the price history window
    pub fn history_range(mut self, range: HistoryRange) -> Self {
        self.history_range = Some(range);
        self
    }

    /// Set the annual risk-free rate
    pub fn risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = Some(rate);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<InvestConfig> {
        let defaults = InvestConfig::default();

        let config = InvestConfig {
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.or(defaults.temperature),
            stage_timeout: self.stage_timeout.or(defaults.stage_timeout),
            execution_mode: self.execution_mode.unwrap_or(defaults.execution_mode),
            language: self.language,
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            alpha_vantage_rpm: self.alpha_vantage_rpm.unwrap_or(defaults.alpha_vantage_rpm),
            benchmark: self.benchmark.unwrap_or(defaults.benchmark),
            history_range: self.history_range.unwrap_or(defaults.history_range),
            risk_free_rate: self.risk_free_rate.unwrap_or(defaults.risk_free_rate),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}
