//! Staged analysis pipelines for invest-crew
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s, each owned by one
//! [`Analyzer`] and declaring which earlier stages it reads. The
//! [`Orchestrator`] runs the stages, hands each one its upstream results,
//! and returns the terminal stage's [`Report`].
//!
//! ```no_run
//! use agent_workflow::{Analyzer, Orchestrator, Pipeline, Stage};
//! # use agent_workflow::AnalyzerExecutor;
//! # use std::sync::Arc;
//! # async fn example(executor: Arc<dyn AnalyzerExecutor>) -> agent_core::Result<()> {
//! let mut builder = Pipeline::builder("AAPL");
//! let research = builder.add_stage(
//!     Stage::builder("research", Analyzer::builder("Analyst").build()?)
//!         .description("Summarize the latest quarter"),
//! );
//! builder.add_stage(
//!     Stage::builder("strategy", Analyzer::builder("Strategist").build()?)
//!         .description("Recommend a position")
//!         .depends_on(research),
//! );
//! let mut pipeline = builder.build()?;
//!
//! let report = Orchestrator::new(executor).run(&mut pipeline).await?;
//! println!("{}", report.to_markdown());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cancel;
pub mod executor;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod stage;

pub use analyzer::{Analyzer, AnalyzerBuilder};
pub use cancel::CancellationToken;
pub use executor::{AnalyzerExecutor, ExecutorConfig, LlmExecutor};
pub use orchestrator::Orchestrator;
pub use pipeline::{ExecutionMode, Pipeline, PipelineBuilder};
pub use report::Report;
pub use stage::{Stage, StageBuilder, StageId, StageInput, StageRecord, UpstreamOutput};
