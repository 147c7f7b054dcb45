//! Alpha Vantage API client

use crate::error::{InvestError, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const FREE_TIER_RPM: NonZeroU32 = NonZeroU32::MIN.saturating_add(4);

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

/// Company overview data
///
/// Alpha Vantage reports every figure as a string, using `"None"` or `"-"`
/// when a value is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_cap: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    pub price_to_book_ratio: Option<String>,
    #[serde(rename = "EPS")]
    pub eps: Option<String>,
    pub profit_margin: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    pub return_on_equity: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY")]
    pub revenue_growth: Option<String>,
    #[serde(rename = "QuarterlyEarningsGrowthYOY")]
    pub earnings_growth: Option<String>,
    pub dividend_yield: Option<String>,
    pub analyst_target_price: Option<String>,
    pub analyst_rating_strong_buy: Option<String>,
    pub analyst_rating_buy: Option<String>,
    pub analyst_rating_hold: Option<String>,
    pub analyst_rating_sell: Option<String>,
    pub analyst_rating_strong_sell: Option<String>,
}

/// Annual financial statements (balance sheet or cash flow)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialReports {
    pub symbol: String,
    pub annual_reports: Vec<HashMap<String, String>>,
}

impl FinancialReports {
    /// Most recent annual report
    pub fn latest(&self) -> Option<&HashMap<String, String>> {
        self.annual_reports.first()
    }
}

/// NEWS_SENTIMENT response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsFeed {
    pub feed: Vec<NewsArticle>,
}

/// One article in the news feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub time_published: String,
    pub source: String,
    pub overall_sentiment_score: f64,
    pub ticker_sentiment: Vec<TickerSentiment>,
}

/// Per-ticker sentiment attached to an article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerSentiment {
    pub ticker: String,
    pub relevance_score: String,
    pub ticker_sentiment_score: String,
    pub ticker_sentiment_label: String,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client with API key and rate limit
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (5 on the free tier)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(FREE_TIER_RPM));

        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create from the `ALPHA_VANTAGE_API_KEY` environment variable with the free-tier limit
    pub fn from_env() -> Result<Self> {
        let api_key = agent_utils::env_opt("ALPHA_VANTAGE_API_KEY").ok_or_else(|| {
            InvestError::Config("ALPHA_VANTAGE_API_KEY environment variable not set".to_string())
        })?;

        Ok(Self::new(api_key, FREE_TIER_RPM.get()))
    }

    /// Point the client at another endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Issue one rate-limited query and check the body for API errors
    #[instrument(skip(self, extra))]
    async fn query(
        &self,
        function: &str,
        symbol: &str,
        extra: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;

        let mut params: Vec<(&str, &str)> =
            vec![("function", function), ("apikey", self.api_key.as_str())];
        params.extend_from_slice(extra);

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InvestError::AlphaVantage(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;
        debug!(function, symbol, "Alpha Vantage response received");

        check_api_errors(symbol, data)
    }

    /// Get company overview and fundamental ratios
    pub async fn get_company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        let data = self
            .query("OVERVIEW", symbol, &[("symbol", symbol)])
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Get annual balance sheets, most recent first
    pub async fn get_balance_sheet(&self, symbol: &str) -> Result<FinancialReports> {
        let data = self
            .query("BALANCE_SHEET", symbol, &[("symbol", symbol)])
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Get annual cash flow statements, most recent first
    pub async fn get_cash_flow(&self, symbol: &str) -> Result<FinancialReports> {
        let data = self
            .query("CASH_FLOW", symbol, &[("symbol", symbol)])
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Get recent news articles with sentiment scores for `symbol`
    pub async fn get_news_sentiment(&self, symbol: &str, limit: usize) -> Result<NewsFeed> {
        let limit = limit.to_string();
        let data = self
            .query(
                "NEWS_SENTIMENT",
                symbol,
                &[("tickers", symbol), ("limit", &limit)],
            )
            .await?;
        Ok(serde_json::from_value(data)?)
    }
}

/// Map Alpha Vantage's in-body error conventions onto errors
fn check_api_errors(symbol: &str, data: serde_json::Value) -> Result<serde_json::Value> {
    if let Some(error) = data.get("Error Message") {
        return Err(InvestError::AlphaVantage(error.to_string()));
    }

    if data.get("Note").is_some() {
        return Err(InvestError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
        });
    }

    if let Some(info) = data.get("Information") {
        return Err(InvestError::AlphaVantage(info.to_string()));
    }

    // Unknown symbols come back as an empty object
    if data.as_object().is_none_or(serde_json::Map::is_empty) {
        return Err(InvestError::InvalidSymbol(symbol.to_string()));
    }

    Ok(data)
}
