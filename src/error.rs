//! Error types for nelie-planner operations.
//!
//! The budgeting stages themselves are total and never fail. Errors only
//! arise at the edges:
//! - Configuration loading and validation
//! - Reading lesson requests, task banks and activity files
//! - Talking to the content generator

use thiserror::Error;

use crate::subject::UnknownSubject;

/// Errors that can occur while loading or validating planner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors that can occur while reading lesson requests or activity files.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Unsupported file format '{0}': expected .json, .yaml or .yml")]
    UnsupportedFormat(String),

    #[error(transparent)]
    UnknownSubject(#[from] UnknownSubject),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors that can occur while generating activities.
///
/// Must be `Clone` so a single failed fetch can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("Content generator failed: {0}")]
    GeneratorFailed(String),

    #[error("Content generator timed out after {millis} ms")]
    Timeout { millis: u64 },

    #[error("No JSON content found in generator response: {0}")]
    NoJson(String),

    #[error("Generator response is truncated JSON ({unclosed} unclosed delimiters)")]
    Truncated { unclosed: usize },

    #[error("Failed to parse generator response: {0}")]
    Parse(String),
}
