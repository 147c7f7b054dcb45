//! Pipeline: an ordered, validated graph of stages

use crate::stage::{Stage, StageBuilder, StageId, StageInput, StageRecord, UpstreamOutput};
use crate::Report;
use agent_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How the orchestrator schedules independent stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One stage at a time, in declared order
    #[default]
    Sequential,
    /// Stages whose upstream results are all present run concurrently, wave by wave
    ForkJoin,
}

/// Ordered stages for one analysis run
///
/// Every upstream reference points at an earlier stage, which
/// [`PipelineBuilder::build`] enforces.
#[derive(Debug, Clone)]
pub struct Pipeline {
    title: String,
    stages: Vec<Stage>,
    mode: ExecutionMode,
}

impl Pipeline {
    /// Start building a pipeline whose report will carry `title`
    pub fn builder(title: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            title: title.into(),
            stages: Vec::new(),
            mode: ExecutionMode::default(),
        }
    }

    /// Title, also used as the report title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Scheduling mode
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Change the scheduling mode
    pub fn set_mode(&mut self, mode: ExecutionMode) {
        self.mode = mode;
    }

    /// Stages in declared order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage by id
    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(id.0)
    }

    /// Stage by name
    pub fn stage_named(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages (never true for a built pipeline)
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Whether every stage has a result
    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.result.is_some())
    }

    /// Forget every stage result and failure
    pub fn clear_results(&mut self) {
        for stage in &mut self.stages {
            stage.result = None;
            stage.error = None;
        }
    }

    /// Indices of stages that failed in the last run
    pub fn failed_stages(&self) -> Vec<usize> {
        self.stages
            .iter()
            .enumerate()
            .filter(|(_, s)| s.error.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Report built from the terminal stage's result, if it ran
    pub fn report(&self) -> Option<Report> {
        let last = self.stages.last()?;
        let record = last.result.as_ref()?;
        Some(Report::new(self.title.clone(), record.text.clone()))
    }

    /// Assemble the input for stage `index` from its upstream results
    ///
    /// Fails with [`Error::Dependency`] if any upstream result is missing.
    pub(crate) fn input_for(&self, index: usize) -> Result<StageInput> {
        let stage = &self.stages[index];
        let mut context = Vec::with_capacity(stage.upstream.len());
        for id in &stage.upstream {
            let upstream = &self.stages[id.0];
            let record = upstream.result.as_ref().ok_or_else(|| Error::Dependency {
                stage: stage.name.clone(),
                missing: upstream.name.clone(),
            })?;
            context.push(UpstreamOutput {
                stage: upstream.name.clone(),
                text: record.text.clone(),
            });
        }

        Ok(StageInput {
            instructions: stage.description.clone(),
            expected_output: stage.expected_output.clone(),
            context,
        })
    }

    /// Whether stage `index` has not run yet and all its upstream results are present
    pub(crate) fn is_ready(&self, index: usize) -> bool {
        let stage = &self.stages[index];
        stage.result.is_none() && stage.upstream.iter().all(|id| self.stages[id.0].result.is_some())
    }

    pub(crate) fn record(&mut self, index: usize, record: StageRecord) {
        self.stages[index].result = Some(record);
    }

    pub(crate) fn record_failure(&mut self, index: usize, err: &Error) {
        self.stages[index].error = Some(err.root_cause().to_string());
    }
}

/// Builder for [`Pipeline`]
pub struct PipelineBuilder {
    title: String,
    stages: Vec<Stage>,
    mode: ExecutionMode,
}

impl PipelineBuilder {
    /// Append a stage and return its id for use in later `depends_on` calls
    pub fn add_stage(&mut self, stage: StageBuilder) -> StageId {
        let id = StageId(self.stages.len());
        self.stages.push(stage.into_stage());
        id
    }

    /// Set the scheduling mode
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate and build
    ///
    /// Rejects an empty pipeline, blank or duplicate stage names, duplicate
    /// upstream ids, and any upstream reference that is not strictly earlier
    /// than the referencing stage.
    pub fn build(self) -> Result<Pipeline> {
        if self.stages.is_empty() {
            return Err(Error::Configuration(
                "pipeline must contain at least one stage".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for (index, stage) in self.stages.iter().enumerate() {
            if stage.name.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "stage {index} has an empty name"
                )));
            }
            if !names.insert(stage.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "duplicate stage name '{}'",
                    stage.name
                )));
            }

            let mut seen = HashSet::new();
            for id in &stage.upstream {
                if id.0 >= index {
                    let missing = self
                        .stages
                        .get(id.0)
                        .map_or_else(|| id.to_string(), |s| s.name.clone());
                    return Err(Error::Dependency {
                        stage: stage.name.clone(),
                        missing,
                    });
                }
                if !seen.insert(id.0) {
                    return Err(Error::Configuration(format!(
                        "stage '{}' lists upstream '{}' more than once",
                        stage.name, self.stages[id.0].name
                    )));
                }
            }
        }

        Ok(Pipeline {
            title: self.title,
            stages: self.stages,
            mode: self.mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Analyzer;
    use std::time::Duration;

    fn analyzer() -> Analyzer {
        Analyzer::builder("Analyst").build().unwrap()
    }

    fn diamond() -> Pipeline {
        let mut builder = Pipeline::builder("AAPL");
        let a = builder.add_stage(Stage::builder("a", analyzer()).description("A"));
        let b = builder.add_stage(Stage::builder("b", analyzer()).description("B"));
        builder.add_stage(
            Stage::builder("c", analyzer())
                .description("C")
                .depends_on(a)
                .depends_on(b),
        );
        builder.build().unwrap()
    }

    #[test]
    fn test_build_valid_pipeline() {
        let pipeline = diamond();
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.title(), "AAPL");
        assert_eq!(pipeline.mode(), ExecutionMode::Sequential);
        assert_eq!(
            pipeline.stage(StageId(2)).unwrap().upstream(),
            &[StageId(0), StageId(1)]
        );
        assert!(pipeline.stage_named("b").is_some());
        assert!(pipeline.report().is_none());
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let result = Pipeline::builder("AAPL").build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut builder = Pipeline::builder("AAPL");
        builder.add_stage(Stage::builder("a", analyzer()).depends_on(StageId(1)));
        builder.add_stage(Stage::builder("b", analyzer()));
        match builder.build() {
            Err(Error::Dependency { stage, missing }) => {
                assert_eq!(stage, "a");
                assert_eq!(missing, "b");
            }
            other => panic!("Expected Dependency error, got {other:?}"),
        }
    }

    #[test]
    fn test_self_and_dangling_references_rejected() {
        let mut builder = Pipeline::builder("AAPL");
        builder.add_stage(Stage::builder("a", analyzer()).depends_on(StageId(0)));
        assert!(matches!(builder.build(), Err(Error::Dependency { .. })));

        let mut builder = Pipeline::builder("AAPL");
        builder.add_stage(Stage::builder("a", analyzer()).depends_on(StageId(7)));
        match builder.build() {
            Err(Error::Dependency { missing, .. }) => assert_eq!(missing, "#7"),
            other => panic!("Expected Dependency error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_upstream_and_names_rejected() {
        let mut builder = Pipeline::builder("AAPL");
        let a = builder.add_stage(Stage::builder("a", analyzer()));
        builder.add_stage(Stage::builder("b", analyzer()).depends_on(a).depends_on(a));
        assert!(matches!(builder.build(), Err(Error::Configuration(_))));

        let mut builder = Pipeline::builder("AAPL");
        builder.add_stage(Stage::builder("a", analyzer()));
        builder.add_stage(Stage::builder("a", analyzer()));
        assert!(matches!(builder.build(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_input_for_requires_upstream_results() {
        let mut pipeline = diamond();
        match pipeline.input_for(2) {
            Err(Error::Dependency { stage, missing }) => {
                assert_eq!(stage, "c");
                assert_eq!(missing, "a");
            }
            other => panic!("Expected Dependency error, got {other:?}"),
        }

        let record = |text: &str| StageRecord {
            text: text.to_string(),
            elapsed: Duration::ZERO,
        };
        pipeline.record(0, record("from a"));
        assert!(!pipeline.is_ready(2));
        pipeline.record(1, record("from b"));
        assert!(pipeline.is_ready(2));

        let input = pipeline.input_for(2).unwrap();
        assert_eq!(input.effective_input(), "C\n\nfrom a\n\nfrom b");
    }

    #[test]
    fn test_report_and_clear() {
        let mut pipeline = diamond();
        for index in 0..3 {
            pipeline.record(
                index,
                StageRecord {
                    text: format!("out {index}"),
                    elapsed: Duration::ZERO,
                },
            );
        }
        assert!(pipeline.is_complete());
        assert_eq!(pipeline.report(), Some(Report::new("AAPL", "out 2")));

        pipeline.clear_results();
        assert!(pipeline.stages().iter().all(|s| s.result().is_none()));
    }
}
