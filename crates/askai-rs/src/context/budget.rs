//! Token budget arithmetic for prompt compaction.
//!
//! A message carries two independent streams, the prompt and the piped
//! context, that share one model window. When the combined text is over
//! budget each stream is shortened against the *current* size of the
//! other one rather than against a fixed half, which leaves a short stream
//! untouched and gives the long one all the remaining room.

/// Tokens reserved for the `"\n"` that joins prompt and context.
pub const SEPARATOR_TOKENS: i64 = 1;

/// Sub-budgets for the two streams of an over-budget message.
///
/// Values are signed: a stream whose counterpart already fills the whole
/// window gets a budget of zero or less, meaning "drop this stream".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSplit {
    /// Room for the prompt stream.
    pub prompt: i64,
    /// Room for the context stream.
    pub context: i64,
}

impl BudgetSplit {
    /// Split `limit` between the prompt and the context given their current
    /// token counts.
    pub fn new(limit: usize, prompt_tokens: usize, context_tokens: usize) -> Self {
        let limit = to_signed(limit);
        Self {
            prompt: limit - to_signed(context_tokens) - SEPARATOR_TOKENS,
            context: limit - to_signed(prompt_tokens) - SEPARATOR_TOKENS,
        }
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "budget split: prompt <= {} tokens, context <= {} tokens",
            self.prompt, self.context
        )
    }
}

/// Number of blocks needed to bring `tokens` under `budget` if each block
/// were summarized down to one budget's worth: `ceil(tokens / budget)`.
///
/// `budget` must be positive.
pub fn block_count(tokens: usize, budget: usize) -> usize {
    tokens.div_ceil(budget.max(1))
}

/// Token limit for each block handed to the summarizer: an even share of
/// `tokens` across `blocks`, minus room for the summarization instruction
/// and its separator.
///
/// May be zero or negative, in which case the text cannot be split into
/// blocks that leave any room for content.
pub fn per_block_limit(tokens: usize, blocks: usize, instruction_tokens: usize) -> i64 {
    let share = to_signed(tokens / blocks.max(1));
    share - (to_signed(instruction_tokens) + SEPARATOR_TOKENS)
}

fn to_signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
