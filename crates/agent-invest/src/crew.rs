//! The fixed three-stage investment crew

use crate::tools::names;
use agent_core::{Error, Result};
use agent_tools::ToolRegistry;
use agent_workflow::{Analyzer, Pipeline, Stage};
use tracing::info;

/// Stage names, in execution order
pub mod stages {
    pub const ANALYSIS: &str = "analysis";
    pub const SENTIMENT_AND_RISK: &str = "sentiment_and_risk";
    pub const STRATEGY: &str = "strategy";
}

/// Trim and upper-case a ticker, rejecting blanks
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(Error::Configuration(
            "stock symbol must not be empty".to_string(),
        ));
    }
    Ok(symbol.to_uppercase())
}

fn investment_analyst(registry: &ToolRegistry) -> Result<Analyzer> {
    Analyzer::builder("Investment Analysis Expert")
        .goal(
            "Conduct comprehensive stock analysis by evaluating both technical trends \
             and fundamental financial health.",
        )
        .backstory(
            "A seasoned investment analyst with expertise in financial markets, combining \
             technical indicators and fundamental metrics to assess stock potential.",
        )
        .capabilities(
            registry,
            &[names::TECHNICAL_ANALYSIS, names::FUNDAMENTAL_ANALYSIS],
        )?
        .build()
}

fn sentiment_and_risk_analyst(registry: &ToolRegistry) -> Result<Analyzer> {
    Analyzer::builder("Sentiment and Risk Analyst")
        .goal(
            "Analyze market sentiment and its potential impact on the stock, and assess \
             the risk level of the stock by evaluating volatility, beta, drawdowns and \
             risk-adjusted returns.",
        )
        .backstory(
            "An expert in behavioral finance, sentiment analysis and risk analysis, capable \
             of gauging market emotions and their effects on stock performance.",
        )
        .capabilities(registry, &[names::SENTIMENT_ANALYSIS, names::RISK_ASSESSMENT])?
        .build()
}

fn strategist() -> Result<Analyzer> {
    Analyzer::builder("Investment Strategist")
        .goal("Develop a comprehensive investment strategy based on all available data.")
        .backstory(
            "A renowned investment strategist known for creating tailored investment plans \
             that balance risk and reward.",
        )
        .build()
}

/// Build the crew's pipeline for `symbol`
///
/// Stage 1 (technical and fundamental analysis) and stage 2 (sentiment and
/// risk) depend only on the symbol; stage 3 (strategy) reads both. No data
/// is fetched here.
///
/// # Errors
///
/// [`Error::Configuration`] for a blank symbol or a registry missing one of
/// the four metric capabilities.
pub fn assemble(symbol: &str, registry: &ToolRegistry) -> Result<Pipeline> {
    let symbol = normalize_symbol(symbol)?;

    let analyst = investment_analyst(registry)?;
    let risk_analyst = sentiment_and_risk_analyst(registry)?;
    let strategist = strategist()?;
    info!(symbol = %symbol, "Agents are built");

    let mut builder = Pipeline::builder(symbol.clone());

    let analysis = builder.add_stage(
        Stage::builder(stages::ANALYSIS, analyst)
            .description(format!(
                "Retrieve market data for {symbol} and conduct a dual-layered analysis:\n\
                 1. Technical Analysis: examine price movements, trend indicators (moving \
                 averages, RSI, MACD) and volatility metrics.\n\
                 2. Fundamental Analysis: review financial statements, key ratios (P/E, \
                 debt-to-equity, ROE) and analyst recommendations to gauge valuation and \
                 profitability.\n\
                 Synthesize both perspectives into a well-rounded investment recommendation."
            ))
            .expected_output(format!(
                "Stock Overview: company name, sector, market cap and industry classification \
                 for {symbol}.\n\
                 Technical Insights: moving averages, RSI, MACD, Bollinger Bands and \
                 support/resistance levels.\n\
                 Fundamental Insights: P/E ratio, P/B ratio, debt-to-equity, revenue and net \
                 income growth, ROE and cash flow strength.\n\
                 Analyst Consensus: aggregated buy/hold/sell recommendations.\n\
                 Final Verdict: overall investment rating based on both technical and \
                 fundamental factors."
            )),
    );

    let sentiment_and_risk = builder.add_stage(
        Stage::builder(stages::SENTIMENT_AND_RISK, risk_analyst)
            .description(format!(
                "Analyze the market sentiment for {symbol} using news data, and analyze its \
                 risk by considering beta, Sharpe ratio, value at risk (95%), max drawdown and \
                 volatility. Evaluate how current sentiment might affect the stock's \
                 performance."
            ))
            .expected_output(format!(
                "A detailed sentiment analysis and risk assessment of {symbol} highlighting \
                 key insights, organized in subsections."
            )),
    );

    builder.add_stage(
        Stage::builder(stages::STRATEGY, strategist)
            .description(format!(
                "Based on all the gathered information for {symbol}, develop a comprehensive \
                 investment strategy. Consider various scenarios and provide actionable \
                 recommendations for different investor profiles."
            ))
            .expected_output(format!(
                "A detailed strategy for {symbol} in markdown format, with subsections on \
                 technical analysis, chart patterns, sentiment analysis and risk assessment."
            ))
            .depends_on(analysis)
            .depends_on(sentiment_and_risk),
    );

    let pipeline = builder.build()?;
    info!(symbol = %symbol, stages = pipeline.len(), "Stages are assigned");
    Ok(pipeline)
}
