//! Tool registry for managing available capabilities

use crate::Tool;
use agent_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Static registry of capabilities, keyed by name
///
/// Analyzers resolve their capability names here once, when they are built.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Builder-style [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Resolve `names` to tool handles, preserving their order
    ///
    /// Fails with a configuration error naming the first unknown capability.
    pub fn resolve(&self, names: &[&str]) -> Result<Vec<Arc<dyn Tool>>> {
        names
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| {
                    Error::Configuration(format!(
                        "unknown capability '{name}' (registered: {})",
                        self.names().join(", ")
                    ))
                })
            })
            .collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
