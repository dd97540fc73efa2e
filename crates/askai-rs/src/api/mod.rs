//! HTTP plumbing shared by the built-in providers.
//!
//! - [`retry`]: classifies failed attempts and retries the transient ones
//!   with exponential backoff, when a retry count is configured.
//! - [`http`]: the JSON-over-HTTPS client with bearer auth and timeouts
//!   used by [`providers`](crate::providers).

pub mod http;
pub mod retry;

pub use http::{HttpClient, HttpConfig};
pub use retry::{CallFailure, RetryConfig};
