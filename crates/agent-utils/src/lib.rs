//! Shared utilities for invest-crew
//!
//! Logging setup and environment helpers used by the library crates and the
//! command-line binary.

pub mod config;
pub mod logging;

pub use config::{env_opt, env_or, env_parse};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
