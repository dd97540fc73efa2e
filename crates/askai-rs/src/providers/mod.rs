//! Provider abstraction for LLM backends.
//!
//! The [`Provider`] trait is the only thing the compaction engine and the
//! dispatcher know about a backend: how large its input window is, how it
//! counts tokens, and how to ask it for completions. Providers are collected
//! into a [`ProviderRegistry`] keyed by provider name (`"openai"`,
//! `"cohere"`), which the [`Dispatcher`](crate::dispatch::Dispatcher) uses to
//! resolve engine identifiers.

pub mod cohere;
pub mod openai;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::Message;
use crate::api::{HttpClient, HttpConfig};
use crate::context::chunk;
use crate::error::AskError;
use crate::tokens::{self, Encoding};

pub use cohere::CohereProvider;
pub use openai::OpenAiProvider;

/// Boxed future returned by [`Provider::ask`].
///
/// Type alias to keep trait signatures and implementations readable.
pub type AskFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>, AskError>> + Send + 'a>>;

// ── Provider trait ─────────────────────────────────────────────────

/// An LLM backend that can be asked for completions.
///
/// Implementors supply the name, the per-model input limit, and
/// [`ask`](Provider::ask). Token counting defaults to exact counting when
/// [`encoding`](Provider::encoding) names a published encoding for the
/// model, and to the heuristic estimate otherwise.
pub trait Provider: Send + Sync {
    /// Registry key, e.g. `"openai"`.
    fn name(&self) -> &str;

    /// Maximum number of input tokens `model` accepts.
    fn max_token_limit(&self, model: &str) -> usize;

    /// Exact tokenizer encoding for `model`, if the provider publishes one.
    fn encoding(&self, _model: &str) -> Option<Encoding> {
        None
    }

    /// Token count of `text` as this provider would see it for `model`.
    fn count_tokens(&self, model: &str, text: &str) -> Result<usize, AskError> {
        tokens::estimate_tokens(text, self.encoding(model))
    }

    /// Split `text` into sentence-aligned chunks of at most `max_tokens`.
    fn split_text(&self, model: &str, text: &str, max_tokens: usize) -> Result<Vec<String>, AskError> {
        chunk::split_text(text, max_tokens, |t| self.count_tokens(model, t))
    }

    /// Send `message` to `model` and return the provider's completions.
    ///
    /// Uses a boxed future so that the trait is dyn-compatible (object-safe).
    fn ask<'a>(&'a self, message: &'a Message, model: &'a str, api_key: &'a str) -> AskFuture<'a>;
}

// ── ProviderRegistry ───────────────────────────────────────────────

/// A read-only-after-construction set of providers, dispatched by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `openai` and `cohere` providers,
    /// sharing one HTTP client built from `http`.
    pub fn builtin(http: &HttpConfig) -> Result<Self, AskError> {
        let client = HttpClient::new(http)?;
        Ok(Self::new()
            .with(OpenAiProvider::new(client.clone()))
            .with(CohereProvider::new(client)))
    }

    /// Register a provider. Replaces any existing provider with the same name.
    pub fn register(&mut self, provider: impl Provider + 'static) {
        self.providers
            .insert(provider.name().to_string(), Arc::new(provider));
    }

    /// Register a provider (builder pattern).
    pub fn with(mut self, provider: impl Provider + 'static) -> Self {
        self.register(provider);
        self
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Names of all registered providers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
