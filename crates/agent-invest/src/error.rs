//! Error types for market data and metric computation

use thiserror::Error;

/// Investment-domain errors
#[derive(Debug, Error)]
pub enum InvestError {
    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        /// Symbol the data was requested for
        symbol: String,
        /// Why no data could be produced
        reason: String,
    },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        /// Upstream API name
        provider: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantage(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    Indicator(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for investment operations
pub type Result<T> = std::result::Result<T, InvestError>;

impl InvestError {
    /// Create a data-unavailable error
    pub fn unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Convert into the shared error type, attributing it to `capability`
    ///
    /// Configuration problems stay configuration errors; every other failure
    /// means the capability could not produce data for `symbol`.
    pub fn into_capability_error(self, symbol: &str, capability: &str) -> agent_core::Error {
        match self {
            Self::Config(msg) => agent_core::Error::Configuration(msg),
            Self::DataUnavailable { symbol, reason } => {
                agent_core::Error::data_unavailable(symbol, capability, reason)
            }
            other => agent_core::Error::data_unavailable(symbol, capability, other.to_string()),
        }
    }
}

impl From<InvestError> for agent_core::Error {
    fn from(err: InvestError) -> Self {
        match err {
            InvestError::Config(msg) => agent_core::Error::Configuration(msg),
            InvestError::DataUnavailable { symbol, reason } => {
                agent_core::Error::data_unavailable(symbol, "market_data", reason)
            }
            InvestError::InvalidSymbol(symbol) => {
                agent_core::Error::data_unavailable(symbol, "market_data", "invalid symbol")
            }
            other => agent_core::Error::data_unavailable("", "market_data", other.to_string()),
        }
    }
}
