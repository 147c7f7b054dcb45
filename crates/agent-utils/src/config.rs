//! Environment helpers for configuration loading

use std::str::FromStr;

/// Read an environment variable, falling back to `default` when unset or blank
pub fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// Read an environment variable, treating unset and blank values as absent
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable
///
/// Returns `Ok(None)` when the variable is unset and an error message naming
/// the key when it is set but does not parse.
pub fn env_parse<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("{key}={raw:?} is invalid: {e}")),
    }
}
