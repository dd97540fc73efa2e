//! Token estimation.
//!
//! Two strategies, picked by whether the target model has a published
//! tokenizer:
//!
//! - **Exact**: the provider's BPE [`Encoding`], counted through `tiktoken-rs`.
//! - **Heuristic**: a single pass over the text that counts runs of letters
//!   (Unicode general category `L`) as roughly 4/3 tokens each and every
//!   other codepoint as one token. It rounds up so that it overestimates
//!   rather than overflows a budget.
//!
//! The two strategies are not comparable with each other. Callers must use
//! one strategy consistently for the whole of a compaction run, which the
//! [`Provider`](crate::providers::Provider) trait guarantees by always
//! estimating with the encoding of the model it is asked about.

pub mod encoding;

pub use encoding::{Encoding, encoding_for_model};

use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

use crate::error::AskError;

/// Tokens per run of letters in the heuristic estimate.
const WORDS_TO_TOKENS_RATIO: f64 = 4.0 / 3.0;

/// Estimate how many tokens `text` consumes.
///
/// With `Some(encoding)` the count is exact; with `None` the heuristic is
/// used. Empty text is always 0 tokens.
pub fn estimate_tokens(text: &str, encoding: Option<Encoding>) -> Result<usize, AskError> {
    match encoding {
        Some(encoding) => encoding.count(text),
        None => Ok(estimate_tokens_roughly(text)),
    }
}

/// Heuristic token estimate: `ceil(letter_runs * 4/3) + non_letters`.
///
/// Combining marks and letter-like numerals are not letters here, so each
/// counts as a token of its own.
pub fn estimate_tokens_roughly(text: &str) -> usize {
    let mut letter_runs = 0usize;
    let mut non_letters = 0usize;
    let mut in_run = false;

    for c in text.chars() {
        if is_letter(c) {
            if !in_run {
                letter_runs += 1;
            }
            in_run = true;
        } else {
            non_letters += 1;
            in_run = false;
        }
    }

    (letter_runs as f64 * WORDS_TO_TOKENS_RATIO).ceil() as usize + non_letters
}

fn is_letter(c: char) -> bool {
    c.general_category_group() == GeneralCategoryGroup::Letter
}

/// Tokens left for a completion once `prompt` is placed in a model window
/// of `model_limit` tokens.
///
/// Fails with [`AskError::BudgetExhausted`] when the prompt already fills
/// the window.
pub fn max_response_tokens(
    prompt: &str,
    model_limit: usize,
    encoding: Option<Encoding>,
) -> Result<usize, AskError> {
    let prompt_tokens = estimate_tokens(prompt, encoding)?;
    match model_limit.checked_sub(prompt_tokens) {
        Some(room) if room > 0 => Ok(room),
        _ => Err(AskError::BudgetExhausted(
            "too many tokens to process".to_string(),
        )),
    }
}
