//! End-to-end crew runs with a fixed metric provider and an echoing model

use agent_core::Error;
use agent_invest::metrics::{
    AnalystRatings, BollingerSnapshot, Headline, MacdSnapshot, SentimentLabel, Trend,
};
use agent_invest::{
    FundamentalMetrics, InvestConfig, InvestError, MetricProvider, RiskMetrics, SentimentMetrics,
    TechnicalMetrics, capability_registry, crew, run_pipeline, run_with,
};
use agent_llm::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, StopReason, TokenUsage,
};
use agent_workflow::{CancellationToken, ExecutionMode, Pipeline};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_test::{assert_err, assert_ok};

/// Returns the same metrics for every symbol, optionally failing one group
#[derive(Default)]
struct FixedMetrics {
    fail: Option<&'static str>,
}

impl FixedMetrics {
    fn failing(group: &'static str) -> Self {
        Self { fail: Some(group) }
    }

    fn check(&self, group: &str, symbol: &str) -> agent_invest::Result<()> {
        if self.fail == Some(group) {
            return Err(InvestError::unavailable(symbol, format!("{group} feed is down")));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricProvider for FixedMetrics {
    async fn technical(&self, symbol: &str) -> agent_invest::Result<TechnicalMetrics> {
        self.check("technical", symbol)?;
        Ok(TechnicalMetrics {
            symbol: symbol.to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 11, 29).unwrap(),
            last_close: 237.33,
            sma_20: Some(229.1),
            sma_50: Some(226.4),
            sma_200: Some(203.8),
            ema_12: 231.2,
            ema_26: 228.7,
            rsi_14: 61.25,
            macd: MacdSnapshot {
                macd: 2.5,
                signal: 1.9,
                histogram: 0.6,
            },
            bollinger: BollingerSnapshot {
                upper: 238.0,
                middle: 229.1,
                lower: 220.2,
            },
            atr_14: 3.4,
            support: 219.7,
            resistance: 237.8,
            trend: Trend::Uptrend,
        })
    }

    async fn fundamental(&self, symbol: &str) -> agent_invest::Result<FundamentalMetrics> {
        self.check("fundamental", symbol)?;
        Ok(FundamentalMetrics {
            symbol: symbol.to_string(),
            name: Some("Apple Inc".to_string()),
            sector: Some("TECHNOLOGY".to_string()),
            industry: None,
            market_cap: Some(3.5e12),
            pe_ratio: Some(38.9),
            pb_ratio: Some(60.1),
            debt_to_equity: Some(1.87),
            revenue_growth: Some(0.061),
            earnings_growth: None,
            return_on_equity: Some(1.57),
            profit_margin: Some(0.24),
            operating_cash_flow: Some(1.18e11),
            analyst_target_price: Some(245.5),
            analyst_ratings: AnalystRatings {
                strong_buy: 7,
                buy: 21,
                hold: 12,
                sell: 2,
                strong_sell: 0,
            },
        })
    }

    async fn sentiment(&self, symbol: &str) -> agent_invest::Result<SentimentMetrics> {
        self.check("sentiment", symbol)?;
        Ok(SentimentMetrics {
            symbol: symbol.to_string(),
            article_count: 12,
            average_score: 0.23,
            label: SentimentLabel::SomewhatBullish,
            headlines: vec![Headline {
                title: "Record services quarter lifts outlook".to_string(),
                source: "Wire".to_string(),
                score: 0.41,
                relevance: 0.92,
            }],
        })
    }

    async fn risk(&self, symbol: &str) -> agent_invest::Result<RiskMetrics> {
        self.check("risk", symbol)?;
        Ok(RiskMetrics {
            symbol: symbol.to_string(),
            benchmark: "SPY".to_string(),
            beta: Some(1.24),
            sharpe_ratio: 1.37,
            value_at_risk_95: -0.0231,
            max_drawdown: -0.1642,
            volatility: 0.2265,
            observations: 251,
        })
    }
}

/// Model that answers with the prompt it was given
#[derive(Default)]
struct EchoModel {
    calls: AtomicUsize,
}

#[async_trait]
impl LLMProvider for EchoModel {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request
            .messages
            .iter()
            .map(Message::text)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(CompletionResponse {
            message: Message::assistant(prompt),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "echo"
    }
}

fn assemble(provider: FixedMetrics) -> Pipeline {
    let registry = capability_registry(Arc::new(provider));
    crew::assemble("aapl", &registry).unwrap()
}

#[test]
fn test_assembly_is_deterministic() {
    let a = assemble(FixedMetrics::default());
    let b = assemble(FixedMetrics::default());

    assert_eq!(a.title(), "AAPL");
    assert_eq!(a.len(), 3);

    let names: Vec<&str> = a.stages().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["analysis", "sentiment_and_risk", "strategy"]);

    assert!(a.stages()[0].upstream().is_empty());
    assert!(a.stages()[1].upstream().is_empty());
    let upstream: Vec<usize> = a.stages()[2].upstream().iter().map(|id| id.index()).collect();
    assert_eq!(upstream, vec![0, 1]);

    for (x, y) in a.stages().iter().zip(b.stages()) {
        assert_eq!(x.name(), y.name());
        assert_eq!(x.description(), y.description());
        assert_eq!(x.expected_output(), y.expected_output());
        assert_eq!(x.analyzer().role(), y.analyzer().role());
        assert_eq!(
            x.analyzer().capability_names(),
            y.analyzer().capability_names()
        );
        assert!(x.result().is_none());
    }
}

#[test]
fn test_blank_symbol_is_rejected() {
    let registry = capability_registry(Arc::new(FixedMetrics::default()));
    let err = assert_err!(crew::assemble("  ", &registry));
    assert!(matches!(err, Error::Configuration(_)));
}

#[tokio::test]
async fn test_strategy_reads_both_upstream_stages() {
    let llm = Arc::new(EchoModel::default());
    let report = assert_ok!(
        run_with(
            "AAPL",
            Arc::new(FixedMetrics::default()),
            llm.clone(),
            &InvestConfig::default(),
        )
        .await
    );

    assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.title, "AAPL");
    // Stage 1 data: technical and fundamental
    assert!(report.content.contains("61.25"));
    assert!(report.content.contains("Apple Inc"));
    // Stage 2 data: sentiment and risk
    assert!(report.content.contains("Record services quarter lifts outlook"));
    assert!(report.content.contains("-0.1642"));
    assert!(report.to_markdown().starts_with("# AAPL\n\n"));
}

#[tokio::test]
async fn test_sentiment_failure_stops_before_strategy() {
    let llm = Arc::new(EchoModel::default());
    let mut pipeline = assemble(FixedMetrics::failing("sentiment"));

    let err = assert_err!(
        run_pipeline(
            &mut pipeline,
            llm.clone(),
            &InvestConfig::default(),
            CancellationToken::new(),
        )
        .await
    );

    assert_eq!(err.failed_stage(), Some((1, "sentiment_and_risk")));
    match err.root_cause() {
        Error::DataUnavailable {
            symbol, capability, ..
        } => {
            assert_eq!(symbol, "AAPL");
            assert_eq!(capability, "sentiment_analysis");
        }
        other => panic!("Expected DataUnavailable, got {other:?}"),
    }

    assert!(pipeline.stages()[0].result().is_some());
    assert!(pipeline.stages()[1].result().is_none());
    assert!(pipeline.stages()[2].result().is_none());
    assert!(pipeline.report().is_none());
    // Only stage 1 reached the model
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fork_join_keeps_sibling_result_on_failure() {
    let config = InvestConfig::builder()
        .execution_mode(ExecutionMode::ForkJoin)
        .build()
        .unwrap();
    let mut pipeline = assemble(FixedMetrics::failing("risk"));

    let err = assert_err!(
        run_pipeline(
            &mut pipeline,
            Arc::new(EchoModel::default()),
            &config,
            CancellationToken::new(),
        )
        .await
    );

    assert_eq!(err.failed_stage(), Some((1, "sentiment_and_risk")));
    assert!(pipeline.stages()[0].result().is_some());
    assert!(pipeline.stages()[2].result().is_none());
}

#[tokio::test]
async fn test_analysis_failure_stops_everything() {
    let mut pipeline = assemble(FixedMetrics::failing("fundamental"));

    let err = assert_err!(
        run_pipeline(
            &mut pipeline,
            Arc::new(EchoModel::default()),
            &InvestConfig::default(),
            CancellationToken::new(),
        )
        .await
    );

    assert_eq!(err.failed_stage(), Some((0, "analysis")));
    assert!(pipeline.stages().iter().all(|s| s.result().is_none()));
}

#[tokio::test]
async fn test_rerun_yields_identical_report() {
    let mut pipeline = assemble(FixedMetrics::default());
    let llm = Arc::new(EchoModel::default());
    let config = InvestConfig::default();

    let first = assert_ok!(
        run_pipeline(&mut pipeline, llm.clone(), &config, CancellationToken::new()).await
    );
    let second = assert_ok!(
        run_pipeline(&mut pipeline, llm.clone(), &config, CancellationToken::new()).await
    );

    assert_eq!(first, second);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_cancelled_run_returns_cancelled() {
    let token = CancellationToken::new();
    token.cancel();
    let mut pipeline = assemble(FixedMetrics::default());

    let err = assert_err!(
        run_pipeline(
            &mut pipeline,
            Arc::new(EchoModel::default()),
            &InvestConfig::default(),
            token,
        )
        .await
    );
    assert!(matches!(err, Error::Cancelled));
}
