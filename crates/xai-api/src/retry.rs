//! Caller-directed retry/backoff helpers.
//!
//! The adapter itself never retries: every failure is classified and
//! surfaced. Callers that want backoff use these helpers to decide whether
//! and how long to wait before re-issuing a request.

use rand::Rng;
use xai_types::ApiError;

/// Configuration for retry behavior on transient API errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Initial delay in milliseconds before the first retry.
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds between retries.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt.
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            backoff_factor: 2.0,
        }
    }
}

/// Returns `true` if the error is transient and the request may be re-issued.
///
/// `StreamInterrupted` is deliberately excluded: re-sending after partial
/// output is a semantic decision only the caller can make.
pub fn is_retryable(error: &ApiError) -> bool {
    matches!(
        error,
        ApiError::RateLimited { .. }
            | ApiError::Server { .. }
            | ApiError::Network(_)
            | ApiError::Timeout
    )
}

/// Calculate the delay in milliseconds before the next retry attempt.
///
/// If `retry_after_ms` is provided (from the server's `Retry-After` header),
/// it is used directly (clamped to `max_delay_ms`). Otherwise, exponential
/// backoff is applied: `initial_delay_ms * backoff_factor^attempt` with
/// ±25% jitter, clamped to `max_delay_ms`.
pub fn calculate_delay(config: &RetryConfig, attempt: u32, retry_after_ms: Option<u64>) -> u64 {
    if let Some(server_delay) = retry_after_ms {
        return server_delay.min(config.max_delay_ms);
    }

    let base = config.initial_delay_ms as f64 * config.backoff_factor.powi(attempt as i32);
    let clamped = base.min(config.max_delay_ms as f64);

    // Apply ±25% jitter
    let jitter_factor = rand::rng().random_range(0.75..=1.25);
    let jittered = clamped * jitter_factor;

    (jittered as u64).min(config.max_delay_ms)
}
