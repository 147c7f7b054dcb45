//! Final report artifact

use serde::{Deserialize, Serialize};

/// Title and markdown body produced by the terminal stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Report title (the symbol under analysis)
    pub title: String,
    /// Markdown-shaped body
    pub content: String,
}

impl Report {
    /// Create a report
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Render as a markdown document with the title as a level-1 heading
    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}\n", self.title, self.content.trim_end())
    }
}
