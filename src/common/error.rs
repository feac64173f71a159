//! Error types for pagetest
//!
//! `NotSupported` and `InterpreterNotFound` are special: they mean the
//! environment lacks a dependency, and turn into a skipped test rather than
//! a failure. Any other error from a dependency check is reported as an error.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pagetest
#[derive(Error, Debug)]
pub enum Error {
    // === Dependency Errors ===
    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Interpreter '{name}' not found. Searched: {searched}")]
    InterpreterNotFound { name: String, searched: String },

    #[error("Dependency check failed: {0}")]
    DependencyCheckFailed(String),

    // === Process Errors ===
    #[error("Failed to spawn interpreter '{path}': {error}")]
    SpawnFailed { path: String, error: String },

    #[error("Failed to generate source for '{test}': {reason}")]
    SourceGeneration { test: String, reason: String },

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid test suite: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an interpreter not found error with the names that were searched
    pub fn interpreter_not_found<S: AsRef<str>>(name: &str, searched: &[S]) -> Self {
        Self::InterpreterNotFound {
            name: name.to_string(),
            searched: searched
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a spawn failure error
    pub fn spawn_failed(path: &std::path::Path, error: &io::Error) -> Self {
        Self::SpawnFailed {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a source generation error
    pub fn source_generation(test: &str, reason: impl Into<String>) -> Self {
        Self::SourceGeneration {
            test: test.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error asks for the test to be skipped
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Error::NotSupported(_) | Error::InterpreterNotFound { .. })
    }
}
