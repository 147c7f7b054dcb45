//! Metric types and the pure computations behind them

pub mod fundamental;
pub mod risk;
pub mod sentiment;
pub mod technical;

pub use fundamental::{AnalystRatings, FundamentalMetrics};
pub use risk::RiskMetrics;
pub use sentiment::{Headline, SentimentLabel, SentimentMetrics};
pub use technical::{BollingerSnapshot, MacdSnapshot, TechnicalMetrics, Trend};
