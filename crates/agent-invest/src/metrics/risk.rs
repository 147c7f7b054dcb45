//! Risk statistics over daily returns

use crate::api::Quote;
use crate::error::{InvestError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trading days per year
pub const TRADING_DAYS: f64 = 252.0;

/// Returns needed for meaningful statistics
pub const MIN_RETURNS: usize = 30;

/// Risk profile of a symbol against a benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub symbol: String,
    pub benchmark: String,
    /// `None` when the two histories share too few trading days
    pub beta: Option<f64>,
    pub sharpe_ratio: f64,
    /// 5th-percentile daily return (a loss is negative)
    pub value_at_risk_95: f64,
    /// Largest peak-to-trough decline, as a negative fraction
    pub max_drawdown: f64,
    /// Annualised standard deviation of daily returns
    pub volatility: f64,
    /// Number of daily returns used
    pub observations: usize,
}

/// Simple returns between consecutive prices
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Dated returns keyed by the later day of each pair
fn dated_returns(bars: &[Quote]) -> Vec<(NaiveDate, f64)> {
    bars.windows(2)
        .filter(|w| w[0].adjclose != 0.0)
        .map(|w| (w[1].date(), w[1].adjclose / w[0].adjclose - 1.0))
        .collect()
}

/// Pair up returns that fall on the same trading day
pub fn align_returns(
    asset: &[(NaiveDate, f64)],
    benchmark: &[(NaiveDate, f64)],
) -> (Vec<f64>, Vec<f64>) {
    let by_date: HashMap<NaiveDate, f64> = benchmark.iter().copied().collect();
    asset
        .iter()
        .filter_map(|(date, r)| by_date.get(date).map(|b| (*r, *b)))
        .unzip()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Covariance of asset with benchmark over the benchmark's variance
pub fn beta(asset: &[f64], benchmark: &[f64]) -> Option<f64> {
    if asset.len() != benchmark.len() || asset.len() < 2 {
        return None;
    }
    let ma = mean(asset)?;
    let mb = mean(benchmark)?;
    let n = (asset.len() - 1) as f64;
    let cov = asset
        .iter()
        .zip(benchmark)
        .map(|(a, b)| (a - ma) * (b - mb))
        .sum::<f64>()
        / n;
    let var = benchmark.iter().map(|b| (b - mb).powi(2)).sum::<f64>() / n;
    (var > 0.0).then(|| cov / var)
}

/// Annualised Sharpe ratio against an annual risk-free rate
pub fn sharpe_ratio(returns: &[f64], risk_free_annual: f64) -> Option<f64> {
    let excess = mean(returns)? - risk_free_annual / TRADING_DAYS;
    let sd = std_dev(returns)?;
    (sd > 0.0).then(|| excess / sd * TRADING_DAYS.sqrt())
}

/// Historical value at risk: the `(1 - confidence)` percentile of returns
///
/// Interpolates linearly between order statistics.
pub fn historical_var(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = (1.0 - confidence) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Largest peak-to-trough decline in `prices`
pub fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &p in prices {
        peak = peak.max(p);
        if peak > 0.0 {
            worst = worst.min(p / peak - 1.0);
        }
    }
    worst
}

pub fn annualized_volatility(returns: &[f64]) -> Option<f64> {
    std_dev(returns).map(|sd| sd * TRADING_DAYS.sqrt())
}

/// Compute the risk profile of `bars` against `benchmark_bars`
pub fn compute(
    symbol: &str,
    bars: &[Quote],
    benchmark: &str,
    benchmark_bars: &[Quote],
    risk_free_rate: f64,
) -> Result<RiskMetrics> {
    let prices: Vec<f64> = bars.iter().map(|q| q.adjclose).collect();
    let returns = daily_returns(&prices);
    if returns.len() < MIN_RETURNS {
        return Err(InvestError::unavailable(
            symbol,
            format!(
                "{} daily returns, at least {MIN_RETURNS} needed",
                returns.len()
            ),
        ));
    }

    let (asset, bench) = align_returns(&dated_returns(bars), &dated_returns(benchmark_bars));
    let beta = if asset.len() >= MIN_RETURNS {
        beta(&asset, &bench)
    } else {
        None
    };

    let insufficient = || InvestError::unavailable(symbol, "degenerate price history");

    Ok(RiskMetrics {
        symbol: symbol.to_string(),
        benchmark: benchmark.to_string(),
        beta,
        sharpe_ratio: sharpe_ratio(&returns, risk_free_rate).ok_or_else(insufficient)?,
        value_at_risk_95: historical_var(&returns, 0.95).ok_or_else(insufficient)?,
        max_drawdown: max_drawdown(&prices),
        volatility: annualized_volatility(&returns).ok_or_else(insufficient)?,
        observations: returns.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::technical::tests::bars;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_daily_returns() {
        let r = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!(approx(r[0], 0.10));
        assert!(approx(r[1], -0.10));
        assert!(daily_returns(&[100.0]).is_empty());
    }

    #[test]
    fn test_beta_of_scaled_series() {
        let bench = [0.01, -0.02, 0.015, 0.0, -0.005];
        let asset: Vec<f64> = bench.iter().map(|b| b * 2.0).collect();
        assert!(approx(beta(&asset, &bench).unwrap(), 2.0));

        assert_eq!(beta(&[0.01, 0.02], &[0.0, 0.0]), None);
        assert_eq!(beta(&[0.01], &[0.01, 0.02]), None);
    }

    #[test]
    fn test_align_returns_by_date() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let asset = [(d(1), 0.01), (d(4), 0.02), (d(5), 0.03)];
        let bench = [(d(4), -0.01), (d(5), 0.04), (d(6), 0.05)];

        let (a, b) = align_returns(&asset, &bench);
        assert_eq!(a, vec![0.02, 0.03]);
        assert_eq!(b, vec![-0.01, 0.04]);
    }

    #[test]
    fn test_historical_var_interpolates() {
        let returns: Vec<f64> = (0..=100).map(|i| f64::from(i) / 1000.0 - 0.05).collect();
        // 5th percentile of -0.050..=0.050 in 0.001 steps
        assert!(approx(historical_var(&returns, 0.95).unwrap(), -0.045));
        assert_eq!(historical_var(&[], 0.95), None);
    }

    #[test]
    fn test_max_drawdown() {
        assert!(approx(max_drawdown(&[100.0, 120.0, 90.0, 130.0, 104.0]), -0.25));
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_sharpe_and_volatility() {
        let returns = [0.01, -0.01, 0.01, -0.01];
        assert!(approx(sharpe_ratio(&returns, 0.0).unwrap(), 0.0));
        assert_eq!(sharpe_ratio(&[0.0, 0.0, 0.0], 0.0), None);

        let sd = std_dev(&returns).unwrap();
        assert!(approx(
            annualized_volatility(&returns).unwrap(),
            sd * TRADING_DAYS.sqrt()
        ));
    }

    #[test]
    fn test_compute_against_benchmark() {
        let asset = bars(120, |i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1);
        let bench = bars(120, |i| 400.0 + (i as f64 * 0.7).sin() * 4.0);

        let metrics = compute("AAPL", &asset, "SPY", &bench, 0.04).unwrap();
        assert_eq!(metrics.benchmark, "SPY");
        assert_eq!(metrics.observations, 119);
        assert!(metrics.beta.unwrap() > 0.0);
        assert!(metrics.max_drawdown < 0.0);
        assert!(metrics.value_at_risk_95 < 0.0);
        assert!(metrics.volatility > 0.0);
    }

    #[test]
    fn test_compute_without_overlap_leaves_beta_empty() {
        let asset = bars(60, |i| 100.0 + (i % 7) as f64);
        let metrics = compute("AAPL", &asset, "SPY", &[], 0.04).unwrap();
        assert_eq!(metrics.beta, None);
    }

    #[test]
    fn test_compute_short_history() {
        let err = compute("IPO", &bars(10, |i| 10.0 + i as f64), "SPY", &[], 0.04).unwrap_err();
        assert!(matches!(err, InvestError::DataUnavailable { .. }));
    }
}
