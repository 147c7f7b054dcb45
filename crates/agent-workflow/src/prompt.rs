//! Prompt rendering for LLM-backed analyzers

use crate::{Analyzer, StageInput};
use agent_core::{Error, Result};
use minijinja::Environment;
use serde::Serialize;

const SYSTEM_TEMPLATE: &str = "\
You are {{ role }}.
{% if backstory %}{{ backstory }}
{% endif %}{% if goal %}Your personal goal is: {{ goal }}
{% endif %}{% if language %}Respond in {{ language }}.
{% endif %}";

const USER_TEMPLATE: &str = "\
Current Task: {{ instructions }}
{% if context %}
This is the context you're working with:
{% for item in context %}
### {{ item.stage }}
{{ item.text }}
{% endfor %}{% endif %}{% if capabilities %}
Data gathered for {{ symbol }}:
{% for cap in capabilities %}
#### {{ cap.name }}: {{ cap.description }}
```json
{{ cap.data }}
```
{% endfor %}{% endif %}{% if expected_output %}
This is the expected criteria for your final answer: {{ expected_output }}
{% endif %}
You MUST return the actual complete content as the final answer, not a summary.";

/// Data one capability returned, ready for the prompt
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityData {
    /// Capability name
    pub name: String,
    /// Capability description
    pub description: String,
    /// Pretty-printed JSON payload
    pub data: String,
}

/// Render the system prompt from the analyzer's role, goal and backstory
pub fn render_system(analyzer: &Analyzer, language: Option<&str>) -> Result<String> {
    render(
        SYSTEM_TEMPLATE,
        minijinja::context! {
            role => analyzer.role(),
            goal => analyzer.goal(),
            backstory => analyzer.backstory(),
            language => language,
        },
    )
}

/// Render the user prompt for one stage
pub fn render_user(symbol: &str, input: &StageInput, capabilities: &[CapabilityData]) -> Result<String> {
    render(
        USER_TEMPLATE,
        minijinja::context! {
            symbol => symbol,
            instructions => &input.instructions,
            expected_output => &input.expected_output,
            context => &input.context,
            capabilities => capabilities,
        },
    )
}

fn render(template: &str, ctx: minijinja::Value) -> Result<String> {
    let env = Environment::new();
    env.render_str(template, ctx)
        .map_err(|e| Error::Configuration(format!("Failed to render prompt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UpstreamOutput;

    fn analyzer() -> Analyzer {
        Analyzer::builder("Investment Strategist")
            .goal("Develop a comprehensive investment strategy")
            .backstory("A seasoned portfolio manager.")
            .build()
            .unwrap()
    }

    #[test]
    fn test_system_prompt() {
        let prompt = render_system(&analyzer(), None).unwrap();
        assert!(prompt.starts_with("You are Investment Strategist."));
        assert!(prompt.contains("A seasoned portfolio manager."));
        assert!(prompt.contains("Your personal goal is: Develop a comprehensive"));
        assert!(!prompt.contains("Respond in"));

        let prompt = render_system(&analyzer(), Some("English")).unwrap();
        assert!(prompt.contains("Respond in English."));
    }

    #[test]
    fn test_user_prompt_includes_context_and_data() {
        let input = StageInput {
            instructions: "Develop an investment strategy for AAPL".to_string(),
            expected_output: "A strategy report".to_string(),
            context: vec![UpstreamOutput {
                stage: "analysis".to_string(),
                text: "RSI is 58 & rising".to_string(),
            }],
        };
        let caps = vec![CapabilityData {
            name: "risk_assessment".to_string(),
            description: "Risk metrics".to_string(),
            data: "{\"beta\": 1.2}".to_string(),
        }];

        let prompt = render_user("AAPL", &input, &caps).unwrap();
        assert!(prompt.starts_with("Current Task: Develop an investment strategy for AAPL"));
        assert!(prompt.contains("### analysis\nRSI is 58 & rising"));
        assert!(prompt.contains("Data gathered for AAPL:"));
        assert!(prompt.contains("{\"beta\": 1.2}"));
        assert!(prompt.contains("expected criteria for your final answer: A strategy report"));
    }

    #[test]
    fn test_user_prompt_without_optional_sections() {
        let input = StageInput {
            instructions: "Analyze".to_string(),
            expected_output: String::new(),
            context: Vec::new(),
        };
        let prompt = render_user("MSFT", &input, &[]).unwrap();
        assert!(!prompt.contains("context you're working with"));
        assert!(!prompt.contains("Data gathered"));
        assert!(!prompt.contains("expected criteria"));
    }
}
