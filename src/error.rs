//! Error types for parcel-ingest
//!
//! This module defines the error hierarchy for the ingestion job.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Field-level parse problems never show up here: coercion degrades to
//! `None` instead of failing (see [`crate::coerce`]).

use thiserror::Error;

/// Maximum length of a failure detail written to the run log
pub const MAX_DETAIL_CHARS: usize = 2000;

/// The main error type for parcel-ingest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    // ============================================================================
    // Upstream Errors
    // ============================================================================
    #[error("Fetch failed for {url}: HTTP {status}: {body}")]
    Fetch {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Destination Errors
    // ============================================================================
    #[error("Write to '{table}' rejected: HTTP {status}: {body}")]
    Sink {
        table: String,
        status: u16,
        body: String,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(table: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Sink {
            table: table.into(),
            status,
            body: body.into(),
        }
    }

    /// Attribute a bare HTTP status failure to an upstream URL
    #[must_use]
    pub fn for_source(self, url: &str) -> Self {
        match self {
            Self::HttpStatus { status, body } => Self::Fetch {
                url: url.to_string(),
                status,
                body,
            },
            other => other,
        }
    }

    /// Attribute a bare HTTP status failure to a destination table
    #[must_use]
    pub fn for_table(self, table: &str) -> Self {
        match self {
            Self::HttpStatus { status, body } => Self::Sink {
                table: table.to_string(),
                status,
                body,
            },
            other => other,
        }
    }

    /// Whether this error was raised before any I/O happened
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::MissingConfigField { .. } | Self::InvalidConfigValue { .. }
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. }
            | Error::Fetch { status, .. }
            | Error::Sink { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// The error message cut to fit a run-log detail column
    pub fn detail(&self) -> String {
        truncate_chars(&self.to_string(), MAX_DETAIL_CHARS)
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Truncate to at most `max` characters on a char boundary
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Result type alias for parcel-ingest
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
