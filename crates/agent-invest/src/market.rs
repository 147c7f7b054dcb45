//! Live metric provider backed by Yahoo Finance and Alpha Vantage

use crate::api::alpha_vantage::{CompanyOverview, FinancialReports, NewsFeed};
use crate::api::{AlphaVantageClient, HistoryRange, Quote, YahooFinanceClient};
use crate::cache::{CacheKey, MetricCache};
use crate::config::InvestConfig;
use crate::error::{InvestError, Result};
use crate::metrics::{self, FundamentalMetrics, RiskMetrics, SentimentMetrics, TechnicalMetrics};
use crate::provider::MetricProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Articles requested per news query
const NEWS_LIMIT: usize = 50;

/// `MetricProvider` over live market data
///
/// Price history comes from Yahoo Finance and is shared by the technical
/// and risk metrics; fundamentals and news come from Alpha Vantage.
#[derive(Debug, Clone)]
pub struct MarketDataProvider {
    yahoo: YahooFinanceClient,
    alpha_vantage: Option<AlphaVantageClient>,
    benchmark: String,
    history_range: HistoryRange,
    risk_free_rate: f64,
    prices: MetricCache<Arc<Vec<Quote>>>,
    overviews: MetricCache<CompanyOverview>,
    statements: MetricCache<FinancialReports>,
    news: MetricCache<NewsFeed>,
}

impl MarketDataProvider {
    pub fn new(config: &InvestConfig) -> Self {
        let alpha_vantage = config
            .alpha_vantage_api_key
            .as_deref()
            .map(|key| AlphaVantageClient::new(key, config.alpha_vantage_rpm));

        if alpha_vantage.is_none() {
            warn!("ALPHA_VANTAGE_API_KEY not set, fundamental and sentiment data are unavailable");
        }

        Self {
            yahoo: YahooFinanceClient::new(),
            alpha_vantage,
            benchmark: config.benchmark.clone(),
            history_range: config.history_range,
            risk_free_rate: config.risk_free_rate,
            prices: MetricCache::new(config.cache_ttl_prices),
            overviews: MetricCache::new(config.cache_ttl_fundamentals),
            statements: MetricCache::new(config.cache_ttl_fundamentals),
            news: MetricCache::new(config.cache_ttl_news),
        }
    }

    fn alpha_vantage(&self, symbol: &str) -> Result<&AlphaVantageClient> {
        self.alpha_vantage
            .as_ref()
            .ok_or_else(|| InvestError::unavailable(symbol, "ALPHA_VANTAGE_API_KEY is not set"))
    }

    async fn history(&self, symbol: &str) -> Result<Arc<Vec<Quote>>> {
        let key = CacheKey::new(symbol, "history", self.history_range);
        self.prices
            .get_or_fetch(key, || async {
                self.yahoo
                    .get_historical_range(symbol, self.history_range)
                    .await
                    .map(Arc::new)
            })
            .await
    }

    /// A missing statement only blanks the figures derived from it
    async fn statement(&self, symbol: &str, statement: Statement) -> Option<FinancialReports> {
        let client = self.alpha_vantage.as_ref()?;
        let key = CacheKey::new(symbol, statement.endpoint(), "annual");
        let fetched = self
            .statements
            .get_or_fetch(key, || async {
                match statement {
                    Statement::BalanceSheet => client.get_balance_sheet(symbol).await,
                    Statement::CashFlow => client.get_cash_flow(symbol).await,
                }
            })
            .await;

        match fetched {
            Ok(reports) => Some(reports),
            Err(e) => {
                warn!(
                    symbol,
                    endpoint = statement.endpoint(),
                    error = %e,
                    "Financial statement unavailable"
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Statement {
    BalanceSheet,
    CashFlow,
}

impl Statement {
    fn endpoint(self) -> &'static str {
        match self {
            Self::BalanceSheet => "BALANCE_SHEET",
            Self::CashFlow => "CASH_FLOW",
        }
    }
}

#[async_trait]
impl MetricProvider for MarketDataProvider {
    #[instrument(skip(self))]
    async fn technical(&self, symbol: &str) -> Result<TechnicalMetrics> {
        let bars = self.history(symbol).await?;
        debug!(bars = bars.len(), "Computing technical indicators");
        metrics::technical::compute(symbol, &bars)
    }

    #[instrument(skip(self))]
    async fn fundamental(&self, symbol: &str) -> Result<FundamentalMetrics> {
        let client = self.alpha_vantage(symbol)?;
        let overview = self
            .overviews
            .get_or_fetch(CacheKey::new(symbol, "OVERVIEW", ""), || {
                client.get_company_overview(symbol)
            })
            .await
            .map_err(|e| match e {
                InvestError::InvalidSymbol(s) => InvestError::unavailable(s, "unknown symbol"),
                other => other,
            })?;

        let balance = self.statement(symbol, Statement::BalanceSheet).await;
        let cash_flow = self.statement(symbol, Statement::CashFlow).await;

        metrics::fundamental::compute(symbol, &overview, balance.as_ref(), cash_flow.as_ref())
    }

    #[instrument(skip(self))]
    async fn sentiment(&self, symbol: &str) -> Result<SentimentMetrics> {
        let client = self.alpha_vantage(symbol)?;
        let feed = self
            .news
            .get_or_fetch(CacheKey::new(symbol, "NEWS_SENTIMENT", NEWS_LIMIT), || {
                client.get_news_sentiment(symbol, NEWS_LIMIT)
            })
            .await?;
        metrics::sentiment::compute(symbol, &feed)
    }

    #[instrument(skip(self))]
    async fn risk(&self, symbol: &str) -> Result<RiskMetrics> {
        let (bars, benchmark) =
            tokio::try_join!(self.history(symbol), self.history(&self.benchmark))?;
        metrics::risk::compute(
            symbol,
            &bars,
            &self.benchmark,
            &benchmark,
            self.risk_free_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_alpha_vantage_capabilities_need_a_key() {
        let provider = MarketDataProvider::new(&InvestConfig::default());

        let err = provider.fundamental("AAPL").await.unwrap_err();
        assert!(matches!(err, InvestError::DataUnavailable { .. }));
        assert!(err.to_string().contains("ALPHA_VANTAGE_API_KEY"));

        let err = provider.sentiment("AAPL").await.unwrap_err();
        assert!(matches!(err, InvestError::DataUnavailable { .. }));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_technical_and_risk() {
        let provider = MarketDataProvider::new(&InvestConfig::default());

        let technical = provider.technical("AAPL").await.unwrap();
        assert!(technical.last_close > 0.0);

        let risk = provider.risk("AAPL").await.unwrap();
        assert_eq!(risk.benchmark, "SPY");
        assert!(risk.beta.is_some());
    }

    #[tokio::test]
    #[ignore] // Requires API key and network access
    async fn test_live_fundamental_and_sentiment() {
        let config = InvestConfig::from_env().unwrap();
        let provider = MarketDataProvider::new(&config);

        let fundamental = provider.fundamental("MSFT").await.unwrap();
        assert!(fundamental.name.is_some());

        let sentiment = provider.sentiment("MSFT").await.unwrap();
        assert!(sentiment.article_count > 0);
    }
}
