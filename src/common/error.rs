//! Error types for the test runner
//!
//! Stage failures carry enough context to be read straight off a failed
//! test result, and each variant maps to a stable code for classification.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Stage Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Object '{name}' not found")]
    NotFound { name: String },

    #[error("Validation failed: {field} = {actual} (expected {expected})")]
    Validation {
        field: String,
        actual: String,
        expected: String,
    },

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Trigger failed: {0}")]
    TriggerFailed(String),

    #[error("{0} test case(s) failed")]
    TestsFailed(usize),

    // === Configuration File Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === API Errors ===
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a not found error for a named object
    pub fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: name.to_string(),
        }
    }

    /// Create a validation error from the observed and expected values
    pub fn validation(
        field: &str,
        actual: &serde_json::Value,
        expected: &serde_json::Value,
    ) -> Self {
        Self::Validation {
            field: field.to_string(),
            actual: actual.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl ToString) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Stable code identifying the class of failure
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) | Error::ConfigParse(_) | Error::Yaml(_) => {
                "CONFIGURATION_ERROR"
            }
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::State(_) => "STATE_ERROR",
            Error::TriggerFailed(_) => "TRIGGER_FAILED",
            Error::TestsFailed(_) => "TESTS_FAILED",
            Error::Authentication(_) => "AUTHENTICATION_ERROR",
            Error::FileRead { .. } | Error::Io(_) => "IO_ERROR",
            Error::Http(_) => "HTTP_ERROR",
            Error::Json(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Message recorded on a failed test result: `[KIND] message`
    pub fn report(&self) -> String {
        format!("[{}] {}", self.kind(), self)
    }
}
