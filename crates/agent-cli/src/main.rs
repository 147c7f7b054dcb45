//! Command-line interface for invest-crew

use agent_invest::{InvestConfig, MarketDataProvider, capability_registry, crew, run_pipeline};
use agent_utils::LogFormat;
use agent_workflow::{CancellationToken, ExecutionMode, Pipeline};
use anyhow::Context as _;
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "invest-crew", version)]
#[command(about = "Three-stage LLM investment analysis for a stock symbol", long_about = None)]
struct Args {
    /// Stock symbol to analyze (e.g. AAPL)
    symbol: String,

    /// Model as <backend>/<model>, e.g. ollama/gemma2:latest or openai/gpt-4o-mini
    #[arg(short, long)]
    model: Option<String>,

    /// Run independent stages concurrently
    #[arg(long)]
    fork_join: bool,

    /// Per-stage time budget in seconds
    #[arg(long, value_name = "SECS")]
    stage_timeout: Option<u64>,

    /// Language the analyzers should respond in
    #[arg(long)]
    language: Option<String>,

    /// Print the report as JSON instead of markdown
    #[arg(long)]
    json: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<InvestConfig> {
        let mut config = InvestConfig::from_env()?;
        if let Some(model) = &self.model {
            config.model = model.parse()?;
        }
        if self.fork_join {
            config.execution_mode = ExecutionMode::ForkJoin;
        }
        if let Some(secs) = self.stage_timeout {
            config.stage_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(language) = &self.language {
            config.language = Some(language.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

/// Per-stage outcome table, printed whether or not the run succeeded
fn stage_summary(pipeline: &Pipeline) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Stage", "Analyzer", "Status", "Elapsed"]);

    for (index, stage) in pipeline.stages().iter().enumerate() {
        let (status, elapsed) = match stage.result() {
            Some(record) => ("done", format!("{:.1}s", record.elapsed.as_secs_f64())),
            None if stage.error().is_some() => ("failed", "-".to_string()),
            None => ("not run", "-".to_string()),
        };
        table.add_row(vec![
            (index + 1).to_string(),
            stage.name().to_string(),
            stage.analyzer().role().to_string(),
            status.to_string(),
            elapsed,
        ]);
    }
    table
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    agent_utils::init_tracing_with(if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let config = args.config()?;
    info!(
        symbol = %args.symbol,
        model = %config.model,
        mode = ?config.execution_mode,
        "Starting invest-crew"
    );

    let llm = agent_llm::provider_for(&config.model, config.llm_timeout.as_secs())?;
    let registry = capability_registry(Arc::new(MarketDataProvider::new(&config)));
    let mut pipeline = crew::assemble(&args.symbol, &registry)?;

    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pipeline");
            on_interrupt.cancel();
        }
    });

    let outcome = run_pipeline(&mut pipeline, llm, &config, cancellation).await;

    eprintln!("{}", stage_summary(&pipeline));

    let report = outcome?;
    let rendered = if args.json {
        serde_json::to_string_pretty(&report)?
    } else {
        report.to_markdown()
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
