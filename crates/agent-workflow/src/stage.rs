//! Stage: one unit of pipeline work

use crate::Analyzer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Position of a stage within its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId(pub(crate) usize);

impl StageId {
    /// Zero-based index in declared order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The result a stage produced, with how long it took
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Generated text
    pub text: String,
    /// Wall-clock time spent in the analyzer
    pub elapsed: Duration,
}

/// A stage bound to one analyzer, with declared upstream dependencies
#[derive(Debug, Clone)]
pub struct Stage {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) expected_output: String,
    pub(crate) analyzer: Arc<Analyzer>,
    pub(crate) upstream: Vec<StageId>,
    pub(crate) result: Option<StageRecord>,
    pub(crate) error: Option<String>,
}

impl Stage {
    /// Start building a stage owned by `analyzer`
    ///
    /// Passing an `Arc<Analyzer>` lets several stages share one analyzer.
    pub fn builder(name: impl Into<String>, analyzer: impl Into<Arc<Analyzer>>) -> StageBuilder {
        StageBuilder {
            name: name.into(),
            description: String::new(),
            expected_output: String::new(),
            analyzer: analyzer.into(),
            upstream: Vec::new(),
        }
    }

    /// Stage name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instructions for the work to perform
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Free-text description of the output shape; never machine-checked
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    /// Owning analyzer
    pub fn analyzer(&self) -> &Arc<Analyzer> {
        &self.analyzer
    }

    /// Upstream stages, in declaration order
    pub fn upstream(&self) -> &[StageId] {
        &self.upstream
    }

    /// Result, present only after the stage ran successfully
    pub fn result(&self) -> Option<&StageRecord> {
        self.result.as_ref()
    }

    /// Result text, if any
    pub fn result_text(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.text.as_str())
    }

    /// Why the stage failed in the last run, if it did
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Builder for [`Stage`]
pub struct StageBuilder {
    name: String,
    description: String,
    expected_output: String,
    analyzer: Arc<Analyzer>,
    upstream: Vec<StageId>,
}

impl StageBuilder {
    /// Set the instructions
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the expected output description
    pub fn expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    /// Declare a dependency on an earlier stage
    pub fn depends_on(mut self, stage: StageId) -> Self {
        self.upstream.push(stage);
        self
    }

    pub(crate) fn into_stage(self) -> Stage {
        Stage {
            name: self.name,
            description: self.description,
            expected_output: self.expected_output,
            analyzer: self.analyzer,
            upstream: self.upstream,
            result: None,
            error: None,
        }
    }
}

/// Output of one upstream stage, as handed to a dependent stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamOutput {
    /// Upstream stage name
    pub stage: String,
    /// Upstream result text
    pub text: String,
}

/// Everything an analyzer receives for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageInput {
    /// Stage instructions
    pub instructions: String,
    /// Expected output description
    pub expected_output: String,
    /// Upstream results, in upstream declaration order
    pub context: Vec<UpstreamOutput>,
}

impl StageInput {
    /// Instructions followed by each upstream result, separated by blank lines
    pub fn effective_input(&self) -> String {
        let mut text = self.instructions.clone();
        for upstream in &self.context {
            text.push_str("\n\n");
            text.push_str(&upstream.text);
        }
        text
    }
}
