//! Retrying provider calls that failed for transient reasons.
//!
//! A [`CallFailure`] says why one HTTP attempt failed. Rate limiting, the
//! usual gateway/overload statuses and connection-level trouble are worth
//! another attempt; everything else (bad requests, auth, unparseable
//! bodies) is not. [`retry_call`] backs off exponentially between attempts.
//!
//! The default [`RetryConfig`] makes no retries, so a failed provider call
//! reaches the caller after exactly one attempt.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// HTTP statuses retried by [`retry_call`].
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first one. `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Factor applied to the delay after each retry.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0-indexed), capped at `max_delay`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Why a single HTTP attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// The server answered with a non-success status.
    Status { code: u16, body: String },
    /// The request never got a complete answer.
    Transport { message: String, transient: bool },
}

impl CallFailure {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CallFailure::Status { code, .. } => RETRYABLE_STATUSES.contains(code),
            CallFailure::Transport { transient, .. } => *transient,
        }
    }
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailure::Status { code, body } => write!(f, "HTTP {code}: {body}"),
            CallFailure::Transport { message, .. } => write!(f, "request failed: {message}"),
        }
    }
}

/// Run `call` until it succeeds, fails permanently, or `config.max_retries`
/// retries are used up.
pub async fn retry_call<T, F, Fut>(config: &RetryConfig, mut call: F) -> Result<T, CallFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallFailure>>,
{
    let mut retry = 0;
    loop {
        let failure = match call().await {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        if retry >= config.max_retries || !failure.is_transient() {
            return Err(failure);
        }

        let delay = config.backoff(retry);
        retry += 1;
        warn!(
            "Transient provider failure ({failure}), retry {retry}/{} in {delay:?}",
            config.max_retries
        );
        tokio::time::sleep(delay).await;
    }
}
