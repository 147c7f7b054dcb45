//! Core types for invest-crew
//!
//! This crate defines the error taxonomy and the execution context shared by
//! the language-model, capability, workflow and investment crates.

pub mod context;
pub mod error;

pub use context::Context;
pub use error::{Error, Result};
