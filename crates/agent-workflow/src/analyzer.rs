//! Analyzer: a configured role driving one stage's work

use agent_core::{Error, Result};
use agent_tools::{Tool, ToolRegistry};
use std::fmt;
use std::sync::Arc;

/// A role (goal, backstory, permitted capabilities) that produces a stage's result
///
/// Immutable once built. Capability names are resolved against a
/// [`ToolRegistry`] when the analyzer is built, so an unknown name fails
/// assembly rather than execution.
#[derive(Clone)]
pub struct Analyzer {
    role: String,
    goal: String,
    backstory: String,
    capabilities: Vec<Arc<dyn Tool>>,
}

impl Analyzer {
    /// Start building an analyzer with the given role label
    pub fn builder(role: impl Into<String>) -> AnalyzerBuilder {
        AnalyzerBuilder {
            role: role.into(),
            goal: String::new(),
            backstory: String::new(),
            capabilities: Vec::new(),
        }
    }

    /// Short role label
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Free-text objective
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Free-text context for the model prompt
    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    /// Resolved capabilities, in declared order
    pub fn capabilities(&self) -> &[Arc<dyn Tool>] {
        &self.capabilities
    }

    /// Names of the resolved capabilities, in declared order
    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("capabilities", &self.capability_names())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Analyzer`]
pub struct AnalyzerBuilder {
    role: String,
    goal: String,
    backstory: String,
    capabilities: Vec<Arc<dyn Tool>>,
}

impl AnalyzerBuilder {
    /// Set the goal
    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// Set the backstory
    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// Grant the named capabilities, resolved against `registry`
    pub fn capabilities(mut self, registry: &ToolRegistry, names: &[&str]) -> Result<Self> {
        for tool in registry.resolve(names)? {
            if self.capabilities.iter().any(|c| c.name() == tool.name()) {
                return Err(Error::Configuration(format!(
                    "capability '{}' granted twice to '{}'",
                    tool.name(),
                    self.role
                )));
            }
            self.capabilities.push(tool);
        }
        Ok(self)
    }

    /// Build the analyzer
    pub fn build(self) -> Result<Analyzer> {
        if self.role.trim().is_empty() {
            return Err(Error::Configuration(
                "analyzer role must not be empty".to_string(),
            ));
        }
        Ok(Analyzer {
            role: self.role,
            goal: self.goal,
            backstory: self.backstory,
            capabilities: self.capabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        async fn invoke(&self, _symbol: &str) -> Result<Value> {
            Ok(json!(null))
        }
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            ""
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new()
            .with(Arc::new(Named("sentiment_analysis")))
            .with(Arc::new(Named("risk_assessment")))
    }

    #[test]
    fn test_builder() {
        let analyzer = Analyzer::builder("Sentiment and Risk Analyst")
            .goal("Assess market sentiment")
            .backstory("Expert in behavioral finance")
            .capabilities(&registry(), &["sentiment_analysis", "risk_assessment"])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(analyzer.role(), "Sentiment and Risk Analyst");
        assert_eq!(analyzer.goal(), "Assess market sentiment");
        assert_eq!(
            analyzer.capability_names(),
            vec!["sentiment_analysis", "risk_assessment"]
        );
    }

    #[test]
    fn test_unknown_capability_rejected_at_build() {
        let result = Analyzer::builder("Strategist").capabilities(&registry(), &["options_flow"]);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_duplicate_capability_rejected() {
        let result = Analyzer::builder("Analyst")
            .capabilities(&registry(), &["risk_assessment", "risk_assessment"]);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_empty_role_rejected() {
        assert!(Analyzer::builder("  ").build().is_err());
    }
}
