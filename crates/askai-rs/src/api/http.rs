//! JSON-over-HTTPS client shared by the built-in providers.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::retry::{CallFailure, RetryConfig, retry_call};
use crate::error::AskError;

/// Default request timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default `User-Agent` header sent to providers.
pub const DEFAULT_USER_AGENT: &str = concat!("askai-rs/", env!("CARGO_PKG_VERSION"));

/// Settings for the HTTP client used by the built-in providers.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout. Default: 120 s.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Retry policy for transient failures. Default: no retries.
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl HttpConfig {
    /// Set the number of retries for transient failures.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retry = RetryConfig::with_retries(retries);
        self
    }
}

/// Async HTTP client that posts JSON bodies with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpClient {
    /// Build a client from `config`.
    pub fn new(config: &HttpConfig) -> Result<Self, AskError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AskError::provider("http", format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    /// POST `body` as JSON to `url` and decode the JSON response.
    ///
    /// Non-2xx statuses become [`AskError::Provider`] errors carrying
    /// `HTTP <status>: <body>`; transient ones are retried first according
    /// to the configured [`RetryConfig`].
    pub async fn post_json<B, R>(
        &self,
        provider: &str,
        url: &str,
        api_key: &str,
        body: &B,
    ) -> Result<R, AskError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let text = retry_call(&self.retry, || self.post_once(url, api_key, body))
            .await
            .map_err(|failure| AskError::provider(provider, failure.to_string()))?;

        serde_json::from_str(&text)
            .map_err(|e| AskError::provider(provider, format!("failed to parse response: {e}")))
    }

    async fn post_once<B>(&self, url: &str, api_key: &str, body: &B) -> Result<String, CallFailure>
    where
        B: Serialize + ?Sized,
    {
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );
        let start = Instant::now();

        let resp = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(transport_failure)?;

        debug!(
            "Provider response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(CallFailure::Status {
                code: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

fn transport_failure(e: reqwest::Error) -> CallFailure {
    CallFailure::Transport {
        transient: e.is_timeout() || e.is_connect() || e.is_request(),
        message: e.to_string(),
    }
}
