//! Technical indicators over daily price history

use crate::api::Quote;
use crate::error::{InvestError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{
    AverageTrueRange, BollingerBands, ExponentialMovingAverage, MovingAverageConvergenceDivergence,
    RelativeStrengthIndex, SimpleMovingAverage,
};

/// Bars needed before MACD's signal line settles
pub const MIN_BARS: usize = 35;

/// Window for support and resistance levels
const LEVEL_WINDOW: usize = 20;

/// Indicator snapshot at the latest bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalMetrics {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub last_close: f64,
    /// `None` when the history is shorter than the window
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_12: f64,
    pub ema_26: f64,
    pub rsi_14: f64,
    pub macd: MacdSnapshot,
    pub bollinger: BollingerSnapshot,
    pub atr_14: f64,
    /// Lowest low over the last 20 bars
    pub support: f64,
    /// Highest high over the last 20 bars
    pub resistance: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdSnapshot {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerSnapshot {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Moving-average alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

impl Trend {
    fn classify(close: f64, sma_50: Option<f64>, sma_200: Option<f64>) -> Self {
        match (sma_50, sma_200) {
            (Some(mid), Some(long)) if close > mid && mid > long => Self::Uptrend,
            (Some(mid), Some(long)) if close < mid && mid < long => Self::Downtrend,
            (Some(mid), None) if close > mid => Self::Uptrend,
            (Some(mid), None) if close < mid => Self::Downtrend,
            _ => Self::Sideways,
        }
    }
}

fn ta_error(e: ta::errors::TaError) -> InvestError {
    InvestError::Indicator(format!("{e:?}"))
}

/// Simple moving average over the full window, if the history covers it
fn sma(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() < period {
        return Ok(None);
    }
    let mut indicator = SimpleMovingAverage::new(period).map_err(ta_error)?;
    Ok(Some(closes.iter().fold(0.0, |_, &c| indicator.next(c))))
}

fn ema(closes: &[f64], period: usize) -> Result<f64> {
    let mut indicator = ExponentialMovingAverage::new(period).map_err(ta_error)?;
    Ok(closes.iter().fold(0.0, |_, &c| indicator.next(c)))
}

/// Compute the indicator snapshot for `bars`, oldest first
pub fn compute(symbol: &str, bars: &[Quote]) -> Result<TechnicalMetrics> {
    let Some(last) = bars.last() else {
        return Err(InvestError::unavailable(symbol, "empty price history"));
    };
    if bars.len() < MIN_BARS {
        return Err(InvestError::unavailable(
            symbol,
            format!(
                "{} bars of history, at least {MIN_BARS} needed",
                bars.len()
            ),
        ));
    }

    let closes: Vec<f64> = bars.iter().map(|q| q.close).collect();

    let mut rsi = RelativeStrengthIndex::new(14).map_err(ta_error)?;
    let mut macd = MovingAverageConvergenceDivergence::new(12, 26, 9).map_err(ta_error)?;
    let mut bb = BollingerBands::new(20, 2.0).map_err(ta_error)?;
    let mut atr = AverageTrueRange::new(14).map_err(ta_error)?;

    let mut rsi_14 = 0.0;
    let mut macd_out = MacdSnapshot {
        macd: 0.0,
        signal: 0.0,
        histogram: 0.0,
    };
    let mut bollinger = BollingerSnapshot {
        upper: 0.0,
        middle: 0.0,
        lower: 0.0,
    };
    let mut atr_14 = 0.0;

    for bar in bars {
        rsi_14 = rsi.next(bar.close);
        let m = macd.next(bar.close);
        macd_out = MacdSnapshot {
            macd: m.macd,
            signal: m.signal,
            histogram: m.histogram,
        };
        let b = bb.next(bar.close);
        bollinger = BollingerSnapshot {
            upper: b.upper,
            middle: b.average,
            lower: b.lower,
        };
        atr_14 = atr.next(bar);
    }

    let recent = &bars[bars.len().saturating_sub(LEVEL_WINDOW)..];
    let resistance = recent.iter().map(|q| q.high).fold(f64::MIN, f64::max);
    let support = recent.iter().map(|q| q.low).fold(f64::MAX, f64::min);

    let sma_50 = sma(&closes, 50)?;
    let sma_200 = sma(&closes, 200)?;

    Ok(TechnicalMetrics {
        symbol: symbol.to_string(),
        as_of: last.date(),
        last_close: last.close,
        sma_20: sma(&closes, 20)?,
        sma_50,
        sma_200,
        ema_12: ema(&closes, 12)?,
        ema_26: ema(&closes, 26)?,
        rsi_14,
        macd: macd_out,
        bollinger,
        atr_14,
        support,
        resistance,
        trend: Trend::classify(last.close, sma_50, sma_200),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    /// Daily bars with closes following `f(i)`
    pub(crate) fn bars(n: usize, f: impl Fn(usize) -> f64) -> Vec<Quote> {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = f(i);
                Quote {
                    timestamp: start + Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000,
                    adjclose: close,
                }
            })
            .collect()
    }

    #[test]
    fn test_rising_series() {
        let history = bars(250, |i| 100.0 + i as f64);
        let metrics = compute("AAPL", &history).unwrap();

        assert_eq!(metrics.last_close, 349.0);
        assert!((metrics.sma_20.unwrap() - 339.5).abs() < 1e-9);
        assert!(metrics.sma_200.is_some());
        assert!(metrics.rsi_14 > 70.0);
        assert!(metrics.macd.macd > 0.0);
        assert_eq!(metrics.trend, Trend::Uptrend);
        assert_eq!(metrics.resistance, 350.0);
        assert_eq!(metrics.support, 329.0);
        assert!((metrics.atr_14 - 2.0).abs() < 1e-6);
        assert!(metrics.bollinger.upper > metrics.bollinger.middle);
    }

    #[test]
    fn test_short_history_omits_long_averages() {
        let history = bars(60, |i| 50.0 - (i as f64) * 0.1);
        let metrics = compute("MSFT", &history).unwrap();

        assert!(metrics.sma_50.is_some());
        assert!(metrics.sma_200.is_none());
        assert_eq!(metrics.trend, Trend::Downtrend);
    }

    #[test]
    fn test_insufficient_history() {
        let err = compute("NEW", &bars(10, |_| 10.0)).unwrap_err();
        assert!(matches!(err, InvestError::DataUnavailable { .. }));

        let err = compute("NONE", &[]).unwrap_err();
        assert!(err.to_string().contains("empty price history"));
    }
}
