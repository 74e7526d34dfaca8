//! # Console Error Types
//!
//! Structured error handling for the console data layer using thiserror.
//!
//! Errors are `Clone` because a single in-flight fetch can be awaited by many
//! callers at once, and every one of them receives the same outcome.

use thiserror::Error;

/// Result type for console operations
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Coarse classification of a [`ConsoleError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvariantViolation,
    TransportFailure,
    Serialization,
    Configuration,
}

/// Errors surfaced by the query cache, the resolver and the API clients
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// The requested entity does not exist upstream
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Data handed to the resolver broke an invariant it relies on
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The API call failed (network error or non-success response)
    #[error("Transport failure{}: {message}", status_suffix(.status))]
    TransportFailure {
        status: Option<u16>,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ConsoleError {
    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Create a transport failure without an HTTP status (network level)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: None,
            message: message.into(),
        }
    }

    /// Create a transport failure from a non-success HTTP response
    pub fn api_status(status: u16, message: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Self::TransportFailure { .. } => ErrorKind::TransportFailure,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Check if error is recoverable (worth retrying)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::TransportFailure { status: None, .. } => true,
            Self::TransportFailure {
                status: Some(status),
                ..
            } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransportFailure {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ConsoleError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for ConsoleError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::Configuration(format!("Invalid header value: {err}"))
    }
}
