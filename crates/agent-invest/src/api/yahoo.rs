//! Yahoo Finance price history

use crate::error::{InvestError, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjclose: f64,
}

impl Quote {
    /// Trading day of the bar
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

impl ta::Open for Quote {
    fn open(&self) -> f64 {
        self.open
    }
}

impl ta::High for Quote {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for Quote {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for Quote {
    fn close(&self) -> f64 {
        self.close
    }
}

impl ta::Volume for Quote {
    fn volume(&self) -> f64 {
        self.volume as f64
    }
}

/// Look-back window for price history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "ytd")]
    YearToDate,
}

impl HistoryRange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::YearToDate => "ytd",
        }
    }

    /// First instant of the window ending at `end`
    pub fn start(self, end: DateTime<Utc>) -> DateTime<Utc> {
        let days = match self {
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
            Self::TwoYears => 730,
            Self::FiveYears => 1825,
            Self::YearToDate => {
                return NaiveDate::from_ymd_opt(end.year(), 1, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map_or(end - chrono::Duration::days(365), |d| d.and_utc());
            }
        };
        end - chrono::Duration::days(days)
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = InvestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            "ytd" => Ok(Self::YearToDate),
            other => Err(InvestError::Config(format!(
                "Invalid history range '{other}', expected one of 3mo, 6mo, 1y, 2y, 5y, ytd"
            ))),
        }
    }
}

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }

    /// Daily bars for `symbol` between `start` and `end`, oldest first
    pub async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| InvestError::YahooFinance(e.to_string()))?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| InvestError::YahooFinance(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| InvestError::YahooFinance(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| InvestError::unavailable(symbol, e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| InvestError::unavailable(symbol, e.to_string()))?;

        let mut bars: Vec<Quote> = quotes
            .iter()
            .filter_map(|q| {
                let timestamp = DateTime::from_timestamp(q.timestamp as i64, 0)?;
                Some(Quote {
                    timestamp,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                    adjclose: q.adjclose,
                })
            })
            .filter(|q| q.close.is_finite() && q.close > 0.0)
            .collect();
        bars.sort_by_key(|q| q.timestamp);

        debug!(symbol, bars = bars.len(), "Fetched price history");

        if bars.is_empty() {
            return Err(InvestError::unavailable(symbol, "no price history returned"));
        }
        Ok(bars)
    }

    /// Daily bars for the given look-back window
    pub async fn get_historical_range(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<Quote>> {
        let end = Utc::now();
        self.get_historical_quotes(symbol, range.start(end), end)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_history_range_parse() {
        assert_eq!("1y".parse::<HistoryRange>().unwrap(), HistoryRange::OneYear);
        assert_eq!(" ytd ".parse::<HistoryRange>().unwrap(), HistoryRange::YearToDate);
        assert!("1d".parse::<HistoryRange>().is_err());
        assert_eq!(HistoryRange::SixMonths.to_string(), "6mo");
    }

    #[test]
    fn test_history_range_start() {
        let end = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(
            HistoryRange::YearToDate.start(end),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            HistoryRange::ThreeMonths.start(end),
            end - chrono::Duration::days(90)
        );
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_historical_range() {
        let client = YahooFinanceClient::new();
        let bars = client
            .get_historical_range("AAPL", HistoryRange::ThreeMonths)
            .await
            .unwrap();
        assert!(bars.len() > 40);
        assert!(bars.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
