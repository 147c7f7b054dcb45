//! Error types shared by every crate in the workspace

use std::time::Duration;
use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pipeline assembly and execution
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing input at assembly time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A stage's upstream results were not available when it was scheduled
    #[error("Stage '{stage}' depends on '{missing}', which has no result")]
    Dependency {
        /// Stage that could not be scheduled
        stage: String,
        /// Upstream stage whose result is missing
        missing: String,
    },

    /// A metric capability could not produce data for the symbol
    #[error("Data unavailable for {symbol} ({capability}): {reason}")]
    DataUnavailable {
        /// Stock symbol the capability was called for
        symbol: String,
        /// Capability name
        capability: String,
        /// Underlying cause
        reason: String,
    },

    /// The analyzer invocation for a stage failed
    #[error("Stage {index} ('{stage}') failed: {source}")]
    StageExecution {
        /// Zero-based position of the stage in the pipeline
        index: usize,
        /// Stage name
        stage: String,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// The language model call failed or returned unusable output
    #[error("Model error: {0}")]
    Model(String),

    /// A stage did not finish within its time budget
    #[error("Stage '{stage}' timed out after {after:?}")]
    Timeout {
        /// Stage name
        stage: String,
        /// Configured budget
        after: Duration,
    },

    /// The pipeline was cancelled by its caller
    #[error("Pipeline cancelled")]
    Cancelled,
}

impl Error {
    /// Create a data-unavailable error
    pub fn data_unavailable(
        symbol: impl Into<String>,
        capability: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error as the failure of a specific stage
    pub fn stage(index: usize, stage: impl Into<String>, source: Error) -> Self {
        Self::StageExecution {
            index,
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// Name of the failed stage, if this is a stage failure
    pub fn failed_stage(&self) -> Option<(usize, &str)> {
        match self {
            Self::StageExecution { index, stage, .. } => Some((*index, stage.as_str())),
            _ => None,
        }
    }

    /// Innermost cause, unwrapping any stage failure layers
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::StageExecution { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
