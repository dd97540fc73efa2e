//! Chunk summarization through the target provider.
//!
//! Each chunk is sent as its own request, the summarization instruction as
//! the prompt and the chunk as the context. Chunks are processed strictly
//! in order and their non-empty completions joined with single spaces, so
//! the combined summary reads in the same order as the source text.

use tracing::{error, trace};

use crate::error::AskError;
use crate::providers::Provider;
use crate::{DEFAULT_SUMMARIZE_PROMPT, Message};

/// Default bound on summarization rounds for a single text.
pub const DEFAULT_MAX_SUMMARY_DEPTH: usize = 8;

/// Configuration for compaction by summarization.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Instruction sent ahead of every chunk. Default: `"Summarize:"`.
    pub prompt: String,
    /// Maximum number of summarize-and-remeasure rounds before giving up.
    pub max_depth: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_SUMMARIZE_PROMPT.to_string(),
            max_depth: DEFAULT_MAX_SUMMARY_DEPTH,
        }
    }
}

impl SummarizerConfig {
    /// Override the summarization instruction.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Override the maximum number of summarization rounds.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Summarizes chunks of text with one provider/model/key.
pub struct Summarizer<'a> {
    provider: &'a dyn Provider,
    model: &'a str,
    api_key: &'a str,
    config: &'a SummarizerConfig,
}

impl<'a> Summarizer<'a> {
    pub fn new(
        provider: &'a dyn Provider,
        model: &'a str,
        api_key: &'a str,
        config: &'a SummarizerConfig,
    ) -> Self {
        Self {
            provider,
            model,
            api_key,
            config,
        }
    }

    /// Build the request that asks for a summary of one chunk.
    pub fn build_request(&self, chunk: &str) -> Message {
        Message::new(self.config.prompt.as_str(), chunk)
    }

    /// Summarize `chunks` in order and return the joined, trimmed summary.
    ///
    /// An empty result is not an error here; the caller decides what a
    /// summary with no content means.
    pub async fn summarize_chunks(&self, chunks: &[String]) -> Result<String, AskError> {
        let mut summary = String::new();

        for chunk in chunks {
            trace!("Asking to shorten part: {chunk}");

            let request = self.build_request(chunk);
            let responses = self
                .provider
                .ask(&request, self.model, self.api_key)
                .await
                .inspect_err(|e| {
                    error!("Engine {} returned error: {e}", self.provider.name());
                })?;

            append_completions(&mut summary, &responses);
        }

        Ok(summary.trim().to_string())
    }
}

/// Append every non-empty completion to `summary`, space-separated.
pub fn append_completions(summary: &mut String, completions: &[String]) {
    for completion in completions.iter().filter(|c| !c.is_empty()) {
        if !summary.is_empty() {
            summary.push(' ');
        }
        summary.push_str(completion);
    }
}
