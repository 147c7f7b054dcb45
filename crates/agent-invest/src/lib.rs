//! Investment analysis crew for invest-crew
//!
//! This crate wires the generic pipeline from `agent-workflow` to market
//! data:
//!
//! - [`MetricProvider`] and its live implementation [`MarketDataProvider`]
//!   (Yahoo Finance price history, Alpha Vantage fundamentals and news)
//! - Technical, fundamental, sentiment and risk metric computations
//! - Capability adapters and [`capability_registry`]
//! - [`crew::assemble`], the fixed three-stage analysis pipeline
//! - [`run_analysis`], the end-to-end entry point
//!
//! ```no_run
//! use agent_invest::{InvestConfig, run_analysis};
//!
//! # async fn example() -> agent_core::Result<()> {
//! let config = InvestConfig::from_env()?;
//! let report = run_analysis("AAPL", &config).await?;
//! println!("{}", report.to_markdown());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod crew;
pub mod error;
pub mod market;
pub mod metrics;
pub mod provider;
pub mod tools;

pub use config::{InvestConfig, InvestConfigBuilder};
pub use error::{InvestError, Result};
pub use market::MarketDataProvider;
pub use metrics::{FundamentalMetrics, RiskMetrics, SentimentMetrics, TechnicalMetrics};
pub use provider::MetricProvider;
pub use tools::capability_registry;

use agent_llm::LLMProvider;
use agent_workflow::{
    CancellationToken, ExecutorConfig, LlmExecutor, Orchestrator, Pipeline, Report,
};
use std::sync::Arc;

/// Analyze `symbol` with live market data and the configured model
pub async fn run_analysis(symbol: &str, config: &InvestConfig) -> agent_core::Result<Report> {
    config.validate()?;
    let llm = agent_llm::provider_for(&config.model, config.llm_timeout.as_secs())?;
    let provider = Arc::new(MarketDataProvider::new(config));
    run_with(symbol, provider, llm, config).await
}

/// Analyze `symbol` with injected collaborators
pub async fn run_with(
    symbol: &str,
    provider: Arc<dyn MetricProvider>,
    llm: Arc<dyn LLMProvider>,
    config: &InvestConfig,
) -> agent_core::Result<Report> {
    let registry = capability_registry(provider);
    let mut pipeline = crew::assemble(symbol, &registry)?;
    run_pipeline(&mut pipeline, llm, config, CancellationToken::new()).await
}

/// Run an assembled pipeline, leaving per-stage results on it
///
/// Callers that want to inspect stage results after a failure assemble
/// the pipeline themselves and use this instead of [`run_with`].
pub async fn run_pipeline(
    pipeline: &mut Pipeline,
    llm: Arc<dyn LLMProvider>,
    config: &InvestConfig,
    cancellation: CancellationToken,
) -> agent_core::Result<Report> {
    pipeline.set_mode(config.execution_mode);

    let executor = LlmExecutor::new(
        llm,
        ExecutorConfig {
            model: config.model.model().to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        },
    );

    let mut orchestrator = Orchestrator::new(Arc::new(executor)).with_cancellation(cancellation);
    if let Some(timeout) = config.stage_timeout {
        orchestrator = orchestrator.with_stage_timeout(timeout);
    }
    if let Some(language) = &config.language {
        orchestrator = orchestrator.with_language(language.clone());
    }

    orchestrator.run(pipeline).await
}
