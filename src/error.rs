//! Error types for the debug console.
//!
//! The capture path (classification, abstraction, appending) never fails;
//! these errors only surface from configuration loading, path-addressed
//! writes into the log store, and snapshot (de)serialization.

use thiserror::Error;

/// Main error type for the debug console
#[derive(Error, Debug)]
pub enum DebugError {
    /// Input the caller must fix
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Path-addressed store write that cannot be applied
    #[error("Invalid path '{path}': {reason}")]
    Path { path: String, reason: String },

    /// Reading a configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of configuration or store content failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DebugError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DebugError::InvalidArgument(message.into())
    }

    pub fn path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        DebugError::Path {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DebugError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_message() {
        let err = DebugError::path("log/9", "index out of range");
        assert_eq!(err.to_string(), "Invalid path 'log/9': index out of range");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: DebugError = parse.unwrap_err().into();
        assert!(matches!(err, DebugError::Json(_)));
    }
}
