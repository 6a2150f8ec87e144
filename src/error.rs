// src/error.rs

//! Unified error handling for the page watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for page watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
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

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression failed to compile
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Download did not finish in time
    #[error("timeout: {url}")]
    Timeout { url: String },

    /// Server answered with a client or server error
    #[error("{url}: ({status}) - {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    /// Encoded cache file name is too long for the filesystem
    #[error("invalid file name length {len}; max length is {max}")]
    FileName { len: usize, max: usize },

    /// Mail delivery failed
    #[error("Mail error: {0}")]
    Mail(String),

    /// Filesystem watcher failed
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Control connection misbehaved
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl AppError {
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

    /// Create a timeout error for the given URL.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Create a mail delivery error.
    pub fn mail(message: impl fmt::Display) -> Self {
        Self::Mail(message.to_string())
    }

    /// Create a control protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether this error is a download timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
