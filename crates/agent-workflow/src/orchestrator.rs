//! Orchestrator: runs a pipeline's stages and returns the terminal report

use crate::stage::{StageInput, StageRecord};
use crate::{Analyzer, AnalyzerExecutor, CancellationToken, ExecutionMode, Pipeline, Report};
use agent_core::{Context, Error, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Executes pipelines with a shared analyzer executor
///
/// A failed stage aborts the run with [`Error::StageExecution`]; results
/// of stages that already finished stay on the pipeline for inspection.
/// Nothing is retried.
pub struct Orchestrator {
    executor: Arc<dyn AnalyzerExecutor>,
    stage_timeout: Option<Duration>,
    cancellation: CancellationToken,
    language: Option<String>,
}

impl Orchestrator {
    /// Create an orchestrator with no timeout and a fresh cancellation token
    pub fn new(executor: Arc<dyn AnalyzerExecutor>) -> Self {
        Self {
            executor,
            stage_timeout: None,
            cancellation: CancellationToken::new(),
            language: None,
        }
    }

    /// Fail any stage that runs longer than `timeout`
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    /// Stop the run when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Ask analyzers to respond in `language`
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Token that cancels runs of this orchestrator
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Run every stage and return the report built from the terminal stage
    ///
    /// Previous results are cleared first, so running the same pipeline twice
    /// with deterministic collaborators yields the same report.
    #[instrument(skip_all, fields(title = %pipeline.title(), mode = ?pipeline.mode()))]
    pub async fn run(&self, pipeline: &mut Pipeline) -> Result<Report> {
        pipeline.clear_results();

        let mut ctx = Context::for_run(pipeline.title());
        if let Some(language) = &self.language {
            ctx = ctx.with_language(language.clone());
        }
        info!(
            run_id = ctx.run_id().unwrap_or_default(),
            stages = pipeline.len(),
            "Starting pipeline"
        );
        let started = Instant::now();

        match pipeline.mode() {
            ExecutionMode::Sequential => self.run_sequential(pipeline, &mut ctx).await?,
            ExecutionMode::ForkJoin => self.run_fork_join(pipeline, &ctx).await?,
        }

        info!(elapsed = ?started.elapsed(), "Pipeline finished");
        pipeline.report().ok_or_else(|| {
            Error::Model(format!(
                "pipeline '{}' finished without a terminal result",
                pipeline.title()
            ))
        })
    }

    async fn run_sequential(&self, pipeline: &mut Pipeline, ctx: &mut Context) -> Result<()> {
        for index in 0..pipeline.len() {
            let input = pipeline.input_for(index)?;
            let stage = &pipeline.stages()[index];
            let name = stage.name().to_string();
            let analyzer = Arc::clone(stage.analyzer());

            ctx.enter_stage(index, &name);
            match self.run_stage(index, &name, &analyzer, &input, ctx).await {
                Ok(record) => pipeline.record(index, record),
                Err(err) => {
                    note_failure(pipeline, index, &err);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    async fn run_fork_join(&self, pipeline: &mut Pipeline, ctx: &Context) -> Result<()> {
        while !pipeline.is_complete() {
            let ready: Vec<usize> = (0..pipeline.len())
                .filter(|&i| pipeline.is_ready(i))
                .collect();

            let Some(&first) = ready.first() else {
                // Unreachable for a validated pipeline.
                let pending = pipeline
                    .stages()
                    .iter()
                    .position(|s| s.result().is_none())
                    .unwrap_or(0);
                return Err(pipeline.input_for(pending).err().unwrap_or_else(|| {
                    Error::Configuration("no runnable stage left".to_string())
                }));
            };
            info!(wave = ?ready, first, "Starting wave");

            let mut jobs = Vec::with_capacity(ready.len());
            for &index in &ready {
                let input = pipeline.input_for(index)?;
                let stage = &pipeline.stages()[index];
                let name = stage.name().to_string();
                let analyzer = Arc::clone(stage.analyzer());
                let mut stage_ctx = ctx.clone();
                stage_ctx.enter_stage(index, &name);
                jobs.push(async move {
                    let outcome = self
                        .run_stage(index, &name, &analyzer, &input, &stage_ctx)
                        .await;
                    (index, outcome)
                });
            }

            let mut failure = None;
            for (index, outcome) in join_all(jobs).await {
                match outcome {
                    Ok(record) => pipeline.record(index, record),
                    Err(err) => {
                        note_failure(pipeline, index, &err);
                        // Results arrive in declared order, so the first error is the earliest stage.
                        if failure.is_none() {
                            failure = Some(err);
                        } else {
                            warn!(error = %err, "Additional stage failure in wave");
                        }
                    }
                }
            }
            if let Some(err) = failure {
                return Err(err);
            }
        }
        Ok(())
    }

    async fn run_stage(
        &self,
        index: usize,
        name: &str,
        analyzer: &Analyzer,
        input: &StageInput,
        ctx: &Context,
    ) -> Result<StageRecord> {
        if self.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        info!(stage = name, index, role = analyzer.role(), "Stage started");
        let started = Instant::now();

        let work = self.executor.execute(analyzer, input, ctx);
        let outcome = tokio::select! {
            () = self.cancellation.cancelled() => return Err(Error::Cancelled),
            outcome = async {
                match self.stage_timeout {
                    Some(after) => tokio::time::timeout(after, work).await.unwrap_or_else(|_| {
                        Err(Error::Timeout { stage: name.to_string(), after })
                    }),
                    None => work.await,
                }
            } => outcome,
        };

        let text = outcome
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(Error::Model(format!("stage '{name}' produced an empty result")))
                } else {
                    Ok(text)
                }
            })
            .map_err(|err| {
                warn!(stage = name, index, error = %err, "Stage failed");
                Error::stage(index, name, err)
            })?;

        let elapsed = started.elapsed();
        info!(stage = name, index, ?elapsed, "Stage finished");
        Ok(StageRecord { text, elapsed })
    }
}

/// Mark the stage failed on the pipeline; cancellation is not a stage failure
fn note_failure(pipeline: &mut Pipeline, index: usize, err: &Error) {
    if !matches!(err, Error::Cancelled) {
        pipeline.record_failure(index, err);
    }
}
