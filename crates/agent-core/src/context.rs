//! Execution context for a pipeline run
//!
//! The `Context` struct is a flexible key-value store the orchestrator fills
//! with run-level facts (the symbol under analysis, a run id, the stage being
//! executed) before handing it to an analyzer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Stock symbol under analysis
    pub const SYMBOL: &str = "symbol";
    /// Unique id of the pipeline run
    pub const RUN_ID: &str = "run_id";
    /// Name of the stage currently executing
    pub const STAGE: &str = "stage";
    /// Zero-based index of the stage currently executing
    pub const STAGE_INDEX: &str = "stage_index";
    /// Response language preference (e.g., "en")
    pub const LANGUAGE: &str = "language";
}

/// Context passed to analyzers during execution
///
/// # Example
///
/// ```
/// use agent_core::Context;
///
/// let ctx = Context::for_run("AAPL").with_language("en");
///
/// assert_eq!(ctx.symbol(), Some("AAPL"));
/// assert_eq!(ctx.language(), Some("en"));
/// assert!(ctx.run_id().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context for a fresh run over `symbol`, with a new run id
    pub fn for_run(symbol: impl Into<String>) -> Self {
        let mut ctx = Self::new();
        ctx.insert(keys::SYMBOL, serde_json::json!(symbol.into()));
        ctx.insert(
            keys::RUN_ID,
            serde_json::json!(uuid::Uuid::new_v4().to_string()),
        );
        ctx
    }

    // =========== Builder Methods ===========

    /// Set the language preference
    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.insert(keys::LANGUAGE, serde_json::json!(lang.into()));
        self
    }

    // =========== Common Accessors ===========

    /// Symbol under analysis
    pub fn symbol(&self) -> Option<&str> {
        self.get(keys::SYMBOL).and_then(|v| v.as_str())
    }

    /// Run id
    pub fn run_id(&self) -> Option<&str> {
        self.get(keys::RUN_ID).and_then(|v| v.as_str())
    }

    /// Language preference
    pub fn language(&self) -> Option<&str> {
        self.get(keys::LANGUAGE).and_then(|v| v.as_str())
    }

    /// Name and index of the stage currently executing
    pub fn stage(&self) -> Option<(usize, &str)> {
        let name = self.get(keys::STAGE).and_then(|v| v.as_str())?;
        let index = self.get(keys::STAGE_INDEX).and_then(serde_json::Value::as_u64)?;
        Some((index as usize, name))
    }

    /// Record the stage about to execute
    pub fn enter_stage(&mut self, index: usize, name: &str) {
        self.insert(keys::STAGE, serde_json::json!(name));
        self.insert(keys::STAGE_INDEX, serde_json::json!(index));
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Insert a typed value into the context
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::Configuration(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the context
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::Configuration(format!(
                        "Failed to deserialize context value: {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
