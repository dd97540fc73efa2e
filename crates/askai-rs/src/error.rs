//! Error type shared by every layer of the crate.
//!
//! Each [`AskError`] variant belongs to one [`ErrorKind`]. The kind decides
//! how far a failure travels: all of them abort the engine unit they occur
//! in, and the [`Dispatcher`](crate::dispatch::Dispatcher) decides from the
//! number of requested engines whether that abort fails the whole call.

use thiserror::Error;

/// Broad classification of an [`AskError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing default model, unknown provider, or missing API key.
    Configuration,
    /// The token estimator could not produce a count.
    Tokenization,
    /// There is no room left in a token budget.
    BudgetExhausted,
    /// Summarization produced nothing usable, or stopped making progress.
    ContentLoss,
    /// The provider backend call itself failed.
    Provider,
}

/// Errors produced while estimating, compacting, or dispatching a prompt.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("no AI engine found")]
    NoEngines,

    #[error("invalid engine name '{0}'")]
    InvalidEngine(String),

    #[error("no provider model found for {0}")]
    NoProviderModel(String),

    #[error("no engine found for {0}")]
    NoEngine(String),

    #[error("no API key found for {0}")]
    NoApiKey(String),

    #[error("token count failed: {0}")]
    Tokenization(String),

    #[error("{0}")]
    BudgetExhausted(String),

    #[error("{0}")]
    ContentLoss(String),

    #[error("{provider}: {message}")]
    Provider { provider: String, message: String },
}

impl AskError {
    /// Build a provider error for the named backend.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        AskError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Prefix a provider error's message with `what`. Other errors are
    /// returned unchanged.
    pub fn with_context(self, what: &str) -> Self {
        match self {
            AskError::Provider { provider, message } => AskError::Provider {
                provider,
                message: format!("{what}: {message}"),
            },
            other => other,
        }
    }

    /// The class of failure this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AskError::NoEngines
            | AskError::InvalidEngine(_)
            | AskError::NoProviderModel(_)
            | AskError::NoEngine(_)
            | AskError::NoApiKey(_) => ErrorKind::Configuration,
            AskError::Tokenization(_) => ErrorKind::Tokenization,
            AskError::BudgetExhausted(_) => ErrorKind::BudgetExhausted,
            AskError::ContentLoss(_) => ErrorKind::ContentLoss,
            AskError::Provider { .. } => ErrorKind::Provider,
        }
    }
}
