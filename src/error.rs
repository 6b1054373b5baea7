//! Error types for the parse evaluator.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, ParseEvalError>;

/// Errors that can occur while producing, storing or evaluating parses.
#[derive(Error, Debug)]
pub enum ParseEvalError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Raw passthrough was requested before any run was stored.
    #[error("No stored runs at '{0}'")]
    RunsNotFound(PathBuf),

    /// Producer output did not contain a balanced `{...}` span.
    #[error("No balanced JSON object found in output: {0}")]
    NoBalancedObject(String),

    /// Producer output did not match the parse schema (unknown field, wrong type).
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// A decoded parse carried an out-of-range value.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The query text was empty.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Every selected provider failed for one request.
    #[error("All providers failed: {0}")]
    AllProvidersFailed(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ParseEvalError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for ParseEvalError {
    fn from(err: reqwest::Error) -> Self {
        ParseEvalError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ParseEvalError {
    fn from(err: serde_json::Error) -> Self {
        ParseEvalError::Serialization(err.to_string())
    }
}
