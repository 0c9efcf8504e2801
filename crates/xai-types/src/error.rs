//! Error hierarchy for the xAI adapter.

use thiserror::Error;

/// Construction-time errors.
///
/// These are fatal and never retried: a handle that fails to construct has
/// made no network call and holds no resources.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported model name: {name}")]
    UnknownModel { name: String },

    #[error("no API key provided and {var} is not set")]
    MissingApiKey { var: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Request-time and stream-time errors.
///
/// Every failure is classified into exactly one kind; the adapter never
/// recovers silently. Retry policy belongs to the caller (see
/// `xai_api::retry`).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed: {message}")]
    Auth { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("response decode error: {message}")]
    Decode { message: String, payload: String },

    #[error("stream interrupted after {} bytes of partial content", partial.len())]
    StreamInterrupted { partial: String },
}
