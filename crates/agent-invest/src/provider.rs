//! The metric capability seam

use crate::error::Result;
use crate::metrics::{FundamentalMetrics, RiskMetrics, SentimentMetrics, TechnicalMetrics};
use async_trait::async_trait;

/// Source of the four metric groups for a stock symbol
///
/// Implementations must be side-effect free with respect to shared state
/// visible to callers; caching is allowed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Moving averages, momentum, volatility bands and price levels
    async fn technical(&self, symbol: &str) -> Result<TechnicalMetrics>;

    /// Valuation, leverage, growth and cash flow figures
    async fn fundamental(&self, symbol: &str) -> Result<FundamentalMetrics>;

    /// Aggregated news sentiment
    async fn sentiment(&self, symbol: &str) -> Result<SentimentMetrics>;

    /// Beta, Sharpe ratio, value at risk, drawdown and volatility
    async fn risk(&self, symbol: &str) -> Result<RiskMetrics>;
}
