//! Capability seam for invest-crew
//!
//! A [`Tool`] is a named data capability taking a stock symbol and returning
//! structured JSON. A [`ToolRegistry`] is the static set of capabilities an
//! analyzer's declared names are checked against.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::Tool;
