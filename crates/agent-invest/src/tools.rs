//! Capability adapters exposing a `MetricProvider` as tools

use crate::provider::MetricProvider;
use agent_tools::{Tool, ToolRegistry};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Registered capability names
pub mod names {
    pub const TECHNICAL_ANALYSIS: &str = "technical_analysis";
    pub const FUNDAMENTAL_ANALYSIS: &str = "fundamental_analysis";
    pub const SENTIMENT_ANALYSIS: &str = "sentiment_analysis";
    pub const RISK_ASSESSMENT: &str = "risk_assessment";
}

fn to_json<T: serde::Serialize>(
    symbol: &str,
    capability: &str,
    value: &T,
) -> agent_core::Result<Value> {
    serde_json::to_value(value).map_err(|e| {
        agent_core::Error::data_unavailable(
            symbol,
            capability,
            format!("unserializable metrics: {e}"),
        )
    })
}

macro_rules! metric_tool {
    ($(#[$doc:meta])* $tool:ident, $name:expr, $method:ident, $description:literal) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $tool {
            provider: Arc<dyn MetricProvider>,
        }

        impl $tool {
            pub fn new(provider: Arc<dyn MetricProvider>) -> Self {
                Self { provider }
            }
        }

        #[async_trait]
        impl Tool for $tool {
            async fn invoke(&self, symbol: &str) -> agent_core::Result<Value> {
                debug!(capability = $name, symbol, "Invoking capability");
                let metrics = self
                    .provider
                    .$method(symbol)
                    .await
                    .map_err(|e| e.into_capability_error(symbol, $name))?;
                to_json(symbol, $name, &metrics)
            }

            fn name(&self) -> &str {
                $name
            }

            fn description(&self) -> &str {
                $description
            }
        }
    };
}

metric_tool!(
    /// Moving averages, RSI, MACD, Bollinger Bands and support/resistance
    TechnicalAnalysisTool,
    names::TECHNICAL_ANALYSIS,
    technical,
    "Technical indicators from daily price history: SMA 20/50/200, EMA 12/26, RSI 14, MACD, Bollinger Bands, ATR 14, support and resistance"
);

metric_tool!(
    /// Valuation, leverage, growth and cash flow
    FundamentalAnalysisTool,
    names::FUNDAMENTAL_ANALYSIS,
    fundamental,
    "Fundamental figures: market cap, P/E, P/B, debt-to-equity, revenue and earnings growth, ROE, operating cash flow and analyst ratings"
);

metric_tool!(
    /// Aggregated news sentiment
    SentimentAnalysisTool,
    names::SENTIMENT_ANALYSIS,
    sentiment,
    "News sentiment: relevance-weighted average score in -1..1, its label, article count and top headlines"
);

metric_tool!(
    /// Beta, Sharpe ratio, VaR, drawdown and volatility
    RiskAssessmentTool,
    names::RISK_ASSESSMENT,
    risk,
    "Risk profile from daily returns: beta against the benchmark, annualised Sharpe ratio, 95% historical VaR, max drawdown and annualised volatility"
);

/// Registry holding all four capabilities over `provider`
pub fn capability_registry(provider: Arc<dyn MetricProvider>) -> ToolRegistry {
    ToolRegistry::new()
        .with(Arc::new(TechnicalAnalysisTool::new(Arc::clone(&provider))))
        .with(Arc::new(FundamentalAnalysisTool::new(Arc::clone(&provider))))
        .with(Arc::new(SentimentAnalysisTool::new(Arc::clone(&provider))))
        .with(Arc::new(RiskAssessmentTool::new(provider)))
}
