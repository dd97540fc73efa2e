//! Recursive compaction of over-budget messages.
//!
//! A [`Compactor`] is bound to one provider, model and API key. It first
//! checks whether a message fits the model window as is; if not, it splits
//! the window between the prompt and the context (see [`BudgetSplit`]) and
//! shortens each stream on its own by summarizing sentence-aligned chunks
//! through the same model, repeating until the stream fits.
//!
//! Every round must make the text strictly smaller, and the number of
//! rounds is capped by [`SummarizerConfig::max_depth`]. A provider that
//! returns summaries no shorter than their input therefore ends in
//! [`AskError::ContentLoss`] instead of looping forever.

use tracing::{debug, info, trace};

use super::budget::{BudgetSplit, block_count, per_block_limit};
use super::summarizer::{Summarizer, SummarizerConfig};
use crate::Message;
use crate::error::AskError;
use crate::providers::Provider;

const CONTENT_LOST: &str = "text content was completely lost as a result of shortening";

/// Shrinks a message to fit a token budget by summarizing it with one
/// provider/model/key.
pub struct Compactor<'a> {
    provider: &'a dyn Provider,
    model: &'a str,
    api_key: &'a str,
    config: &'a SummarizerConfig,
}

impl<'a> Compactor<'a> {
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

    fn count(&self, text: &str) -> Result<usize, AskError> {
        self.provider.count_tokens(self.model, text)
    }

    /// Whether the joined message fits in `limit` tokens.
    pub fn fits(&self, message: &Message, limit: usize) -> Result<bool, AskError> {
        Ok(self.count(&message.full_prompt())? <= limit)
    }

    /// Return `message` unchanged if it fits in `limit` tokens, otherwise a
    /// shortened copy.
    ///
    /// No provider call is made for a message that already fits.
    pub async fn compact(&self, message: Message, limit: usize) -> Result<Message, AskError> {
        let total = self.count(&message.full_prompt())?;
        if total <= limit {
            return Ok(message);
        }

        info!(
            "Full prompt is too long ({total} tokens), shortening it to {limit} tokens at max"
        );

        let prompt_tokens = self.count(&message.prompt)?;
        let context_tokens = self.count(&message.context)?;
        let split = BudgetSplit::new(limit, prompt_tokens, context_tokens);
        debug!(
            "{} (prompt {prompt_tokens} tokens, context {context_tokens} tokens)",
            split.to_log_string()
        );

        let prompt = self.shorten(&message.prompt, split.prompt).await?;
        let context = self.shorten(&message.context, split.context).await?;

        Ok(Message { prompt, context })
    }

    /// Shorten `text` to at most `max_tokens` tokens.
    ///
    /// Empty text and a budget of zero or less both yield an empty string.
    /// Text that already fits is returned unchanged.
    pub async fn shorten(&self, text: &str, max_tokens: i64) -> Result<String, AskError> {
        if text.is_empty() || max_tokens <= 0 {
            return Ok(String::new());
        }
        let budget = usize::try_from(max_tokens).unwrap_or(usize::MAX);

        let mut tokens = self.count(text)?;
        if tokens <= budget {
            return Ok(text.to_string());
        }

        trace!("Shortening text: {text}");

        let instruction_tokens = self.count(&self.config.prompt)?;
        let summarizer = Summarizer::new(self.provider, self.model, self.api_key, self.config);
        let mut current = text.to_string();

        for round in 1..=self.config.max_depth {
            let blocks = block_count(tokens, budget);
            let block_limit = per_block_limit(tokens, blocks, instruction_tokens);
            if block_limit <= 0 {
                return Err(AskError::BudgetExhausted(format!(
                    "shortening impossible: {tokens} tokens in {blocks} block(s) leave no room \
                     next to a {instruction_tokens}-token summarization prompt"
                )));
            }
            let block_limit = usize::try_from(block_limit).unwrap_or(usize::MAX);

            let chunks = self.provider.split_text(self.model, &current, block_limit)?;
            debug!(
                "Summarization round {round}: {tokens} tokens -> {} chunk(s) of <= {block_limit} tokens",
                chunks.len()
            );

            let summary = summarizer.summarize_chunks(&chunks).await?;
            if summary.is_empty() {
                return Err(AskError::ContentLoss(CONTENT_LOST.to_string()));
            }

            let summary_tokens = self.count(&summary)?;
            if summary_tokens <= budget {
                trace!("Shortened text: {summary}");
                return Ok(summary);
            }
            if summary_tokens >= tokens {
                return Err(AskError::ContentLoss(format!(
                    "summarization made no progress: {tokens} tokens became {summary_tokens}"
                )));
            }

            current = summary;
            tokens = summary_tokens;
        }

        Err(AskError::ContentLoss(format!(
            "text still has {tokens} tokens after {} summarization round(s), limit is {budget}",
            self.config.max_depth
        )))
    }
}
