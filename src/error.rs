// src/error.rs

//! Unified error handling for the collector.
//!
//! None of these errors are fatal to a collection run: clients turn them into
//! empty results, sinks count them as not-saved, and the orchestrator records
//! them per source. Only the CLI surfaces them as a process failure.

use std::fmt;

use thiserror::Error;

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required credential is absent or blank
    #[error("{0} is not configured")]
    NotConfigured(String),

    /// Timeout, connection failure or non-2xx status
    #[error("Transport error for {context}: {message}")]
    Transport { context: String, message: String },

    /// Malformed JSON, unexpected result code or missing HTML structure
    #[error("Parse error for {context}: {message}")]
    Parse { context: String, message: String },

    /// The remote store rejected a write
    #[error("Persistence error for {context}: {message}")]
    Persistence { context: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet writing failed
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a "not configured" error for a named credential or endpoint.
    pub fn not_configured(what: impl Into<String>) -> Self {
        Self::NotConfigured(what.into())
    }

    /// Create a transport error with context.
    pub fn transport(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error with context.
    pub fn persistence(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error came from a missing credential rather than a failure.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_message() {
        let err = AppError::not_configured("DATA_GO_KR_API_KEY");
        assert_eq!(err.to_string(), "DATA_GO_KR_API_KEY is not configured");
        assert!(err.is_not_configured());
    }

    #[test]
    fn test_transport_is_distinguishable() {
        let err = AppError::transport("https://example.com", "timed out");
        assert!(!err.is_not_configured());
        assert!(err.to_string().contains("timed out"));
    }
}
