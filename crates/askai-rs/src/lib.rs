//! Token-budget-aware prompt compaction and multi-provider LLM dispatch.
//!
//! `askai-rs` sends a prompt, plus optional piped context, to one or more
//! LLM providers and collects their completions. Before each call it checks
//! whether the message fits the target model's input window and, if not,
//! shrinks it by recursive summarization through the model itself.
//!
//! # Getting started
//!
//! ```ignore
//! use askai_rs::{Dispatcher, DispatchConfig, Message, ProviderRegistry};
//! use askai_rs::api::HttpConfig;
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), askai_rs::AskError> {
//!     let registry = ProviderRegistry::builtin(&HttpConfig::default())?;
//!     let keys = HashMap::from([("openai".to_string(), std::env::var("OPENAI_API_KEY").unwrap())]);
//!
//!     let dispatcher = Dispatcher::new(registry, keys, DispatchConfig::default());
//!     let message = Message::new("Summarize this log", std::fs::read_to_string("big.log").unwrap());
//!
//!     let responses = dispatcher.dispatch(&["openai".to_string()], &message).await?;
//!     for (engine, completions) in responses {
//!         println!("#{engine}#\n{}", completions.join("\n"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tokens`] | Exact (`tiktoken-rs`) and heuristic token estimation |
//! | [`context`] | Sentence segmentation, chunk packing, budget split, recursive compaction |
//! | [`providers`] | [`Provider`] trait, [`ProviderRegistry`], OpenAI and Cohere backends |
//! | [`dispatch`] | Engine resolution and concurrent fan-out over engines |
//! | [`api`] | Shared HTTP client and retry policy |
//! | [`error`] | [`AskError`] and its [`ErrorKind`](error::ErrorKind) classes |

pub mod api;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod providers;
pub mod tokens;

pub use context::{Compactor, SummarizerConfig};
pub use dispatch::{DispatchConfig, Dispatcher, EngineCallResult, EngineId};
pub use error::{AskError, ErrorKind};
pub use providers::{AskFuture, Provider, ProviderRegistry};

/// Summarization instruction sent ahead of every chunk during compaction.
pub const DEFAULT_SUMMARIZE_PROMPT: &str = "Summarize:";

// ── Message ────────────────────────────────────────────────────────

/// A request to a provider: the user's prompt and the piped context.
///
/// The two streams are kept apart so that compaction can budget them
/// independently; they are only joined by [`full_prompt`](Message::full_prompt)
/// when the message is measured or sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub prompt: String,
    pub context: String,
}

impl Message {
    pub fn new(prompt: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: context.into(),
        }
    }

    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self::new(prompt, String::new())
    }

    /// The text actually measured and sent: see [`join_prompt`].
    pub fn full_prompt(&self) -> String {
        join_prompt(&self.prompt, &self.context)
    }

    /// Whether both streams are empty.
    pub fn is_empty(&self) -> bool {
        self.prompt.is_empty() && self.context.is_empty()
    }
}

/// Join a prompt and its context: `prompt + "\n" + context` when both are
/// present, otherwise whichever one is non-empty.
pub fn join_prompt(prompt: &str, context: &str) -> String {
    match (prompt.is_empty(), context.is_empty()) {
        (false, false) => format!("{prompt}\n{context}"),
        (false, true) => prompt.to_string(),
        (true, false) => context.to_string(),
        (true, true) => String::new(),
    }
}
