//! Error hierarchy for Tether.

use thiserror::Error;

/// Top-level error for a conversation exchange.
#[derive(Debug, Error)]
pub enum TetherError {
    #[error("Model backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Exchange exceeded the maximum of {max_turns} model turns")]
    TurnLimit { max_turns: usize },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors from a model backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Server overloaded")]
    Overloaded,

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream parse error: {0}")]
    StreamParse(String),

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Request timeout")]
    Timeout,
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
