//! Upstream market data APIs

pub mod alpha_vantage;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use yahoo::{HistoryRange, Quote, YahooFinanceClient};
