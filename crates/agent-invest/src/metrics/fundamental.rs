//! Fundamental ratios from company filings

use crate::api::alpha_vantage::{CompanyOverview, FinancialReports};
use crate::error::{InvestError, Result};
use serde::{Deserialize, Serialize};

/// Valuation, leverage, growth and analyst figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalMetrics {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    /// Quarterly revenue growth, year over year
    pub revenue_growth: Option<f64>,
    /// Quarterly earnings growth, year over year
    pub earnings_growth: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub profit_margin: Option<f64>,
    /// Latest annual operating cash flow
    pub operating_cash_flow: Option<f64>,
    pub analyst_target_price: Option<f64>,
    pub analyst_ratings: AnalystRatings,
}

/// Analyst recommendation counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystRatings {
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

impl AnalystRatings {
    pub fn total(&self) -> u32 {
        self.strong_buy + self.buy + self.hold + self.sell + self.strong_sell
    }
}

/// Parse an Alpha Vantage figure, treating `"None"`, `"-"` and blanks as missing
pub fn parse_figure(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw == "None" || raw == "-" {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_count(raw: Option<&str>) -> u32 {
    raw.and_then(|r| r.trim().parse().ok()).unwrap_or(0)
}

fn non_empty(raw: Option<&String>) -> Option<String> {
    raw.map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "None")
        .map(str::to_string)
}

/// Debt over shareholder equity from the latest balance sheet
fn debt_to_equity(balance: &FinancialReports) -> Option<f64> {
    let report = balance.latest()?;
    let field = |key: &str| parse_figure(report.get(key).map(String::as_str));

    let debt = field("shortLongTermDebtTotal").or_else(|| field("totalLiabilities"))?;
    let equity = field("totalShareholderEquity")?;
    (equity != 0.0).then(|| debt / equity)
}

/// Combine the overview with the optional statements
pub fn compute(
    symbol: &str,
    overview: &CompanyOverview,
    balance: Option<&FinancialReports>,
    cash_flow: Option<&FinancialReports>,
) -> Result<FundamentalMetrics> {
    if overview.symbol.trim().is_empty() && overview.name.is_none() {
        return Err(InvestError::unavailable(symbol, "no company overview"));
    }

    let operating_cash_flow = cash_flow
        .and_then(FinancialReports::latest)
        .and_then(|r| parse_figure(r.get("operatingCashflow").map(String::as_str)));

    Ok(FundamentalMetrics {
        symbol: symbol.to_string(),
        name: non_empty(overview.name.as_ref()),
        sector: non_empty(overview.sector.as_ref()),
        industry: non_empty(overview.industry.as_ref()),
        market_cap: parse_figure(overview.market_cap.as_deref()),
        pe_ratio: parse_figure(overview.pe_ratio.as_deref()),
        pb_ratio: parse_figure(overview.price_to_book_ratio.as_deref()),
        debt_to_equity: balance.and_then(debt_to_equity),
        revenue_growth: parse_figure(overview.revenue_growth.as_deref()),
        earnings_growth: parse_figure(overview.earnings_growth.as_deref()),
        return_on_equity: parse_figure(overview.return_on_equity.as_deref()),
        profit_margin: parse_figure(overview.profit_margin.as_deref()),
        operating_cash_flow,
        analyst_target_price: parse_figure(overview.analyst_target_price.as_deref()),
        analyst_ratings: AnalystRatings {
            strong_buy: parse_count(overview.analyst_rating_strong_buy.as_deref()),
            buy: parse_count(overview.analyst_rating_buy.as_deref()),
            hold: parse_count(overview.analyst_rating_hold.as_deref()),
            sell: parse_count(overview.analyst_rating_sell.as_deref()),
            strong_sell: parse_count(overview.analyst_rating_strong_sell.as_deref()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overview() -> CompanyOverview {
        serde_json::from_value(json!({
            "Symbol": "AAPL",
            "Name": "Apple Inc",
            "Sector": "TECHNOLOGY",
            "Industry": "ELECTRONIC COMPUTERS",
            "MarketCapitalization": "3400000000000",
            "PERatio": "33.5",
            "PriceToBookRatio": "-",
            "ReturnOnEquityTTM": "1.57",
            "QuarterlyRevenueGrowthYOY": "0.061",
            "QuarterlyEarningsGrowthYOY": "None",
            "AnalystTargetPrice": "245.5",
            "AnalystRatingStrongBuy": "7",
            "AnalystRatingBuy": "21",
            "AnalystRatingHold": "12",
            "AnalystRatingSell": "2",
            "AnalystRatingStrongSell": "-"
        }))
        .unwrap()
    }

    fn reports(fields: serde_json::Value) -> FinancialReports {
        serde_json::from_value(json!({ "symbol": "AAPL", "annualReports": [fields] })).unwrap()
    }

    #[test]
    fn test_parse_figure() {
        assert_eq!(parse_figure(Some(" 12.5 ")), Some(12.5));
        assert_eq!(parse_figure(Some("None")), None);
        assert_eq!(parse_figure(Some("-")), None);
        assert_eq!(parse_figure(Some("n/a")), None);
        assert_eq!(parse_figure(None), None);
    }

    #[test]
    fn test_compute_from_overview_only() {
        let metrics = compute("AAPL", &overview(), None, None).unwrap();

        assert_eq!(metrics.name.as_deref(), Some("Apple Inc"));
        assert_eq!(metrics.pe_ratio, Some(33.5));
        assert_eq!(metrics.pb_ratio, None);
        assert_eq!(metrics.earnings_growth, None);
        assert_eq!(metrics.debt_to_equity, None);
        assert_eq!(metrics.analyst_ratings.total(), 42);
        assert_eq!(metrics.analyst_ratings.strong_sell, 0);
    }

    #[test]
    fn test_compute_with_statements() {
        let balance = reports(json!({
            "totalLiabilities": "300000",
            "shortLongTermDebtTotal": "120000",
            "totalShareholderEquity": "60000"
        }));
        let cash_flow = reports(json!({ "operatingCashflow": "118254000000" }));

        let metrics = compute("AAPL", &overview(), Some(&balance), Some(&cash_flow)).unwrap();
        assert_eq!(metrics.debt_to_equity, Some(2.0));
        assert_eq!(metrics.operating_cash_flow, Some(118_254_000_000.0));
    }

    #[test]
    fn test_debt_falls_back_to_liabilities() {
        let balance = reports(json!({
            "totalLiabilities": "90",
            "shortLongTermDebtTotal": "None",
            "totalShareholderEquity": "30"
        }));
        assert_eq!(debt_to_equity(&balance), Some(3.0));

        let zero_equity = reports(json!({ "totalLiabilities": "90", "totalShareholderEquity": "0" }));
        assert_eq!(debt_to_equity(&zero_equity), None);
    }

    #[test]
    fn test_empty_overview_is_unavailable() {
        let err = compute("ZZZZ", &CompanyOverview::default(), None, None).unwrap_err();
        assert!(matches!(err, InvestError::DataUnavailable { .. }));
    }
}
