//! Exact BPE encodings published by providers.
//!
//! Encoding tables are loaded through `tiktoken-rs` the first time they are
//! needed and then shared for the rest of the process.

use std::fmt;
use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;
use tracing::debug;

use crate::error::AskError;

/// A provider tokenizer encoding with an exact token count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// GPT-3.5 / GPT-4 chat models and the ada-002 embeddings.
    Cl100kBase,
    /// Codex and the instruct `text-davinci-00x` models.
    P50kBase,
    /// The original GPT-3 base models.
    R50kBase,
}

/// Model-name prefixes and the encoding each maps to. Longest prefixes
/// come first so that `text-davinci-003` is not caught by `davinci`.
const MODEL_PREFIX_TO_ENCODING: &[(&str, Encoding)] = &[
    ("gpt-4", Encoding::Cl100kBase),
    ("gpt-3.5-turbo", Encoding::Cl100kBase),
    ("text-embedding-ada-002", Encoding::Cl100kBase),
    ("text-davinci-003", Encoding::P50kBase),
    ("text-davinci-002", Encoding::P50kBase),
    ("code-davinci", Encoding::P50kBase),
    ("code-cushman", Encoding::P50kBase),
    ("text-davinci-001", Encoding::R50kBase),
    ("text-curie", Encoding::R50kBase),
    ("text-babbage", Encoding::R50kBase),
    ("text-ada", Encoding::R50kBase),
    ("davinci", Encoding::R50kBase),
    ("curie", Encoding::R50kBase),
    ("babbage", Encoding::R50kBase),
    ("ada", Encoding::R50kBase),
];

/// Look up the exact encoding for a model. `None` means the model has no
/// public tokenizer and callers should fall back to heuristic estimation.
pub fn encoding_for_model(model: &str) -> Option<Encoding> {
    MODEL_PREFIX_TO_ENCODING
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, encoding)| *encoding)
}

type CachedBpe = OnceLock<Result<CoreBPE, String>>;

static CL100K_BASE: CachedBpe = OnceLock::new();
static P50K_BASE: CachedBpe = OnceLock::new();
static R50K_BASE: CachedBpe = OnceLock::new();

impl Encoding {
    /// Canonical encoding identifier, as published by the provider.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::P50kBase => "p50k_base",
            Encoding::R50kBase => "r50k_base",
        }
    }

    /// Count the tokens in `text` under this encoding.
    pub fn count(self, text: &str) -> Result<usize, AskError> {
        if text.is_empty() {
            return Ok(0);
        }

        Ok(self.load()?.encode_with_special_tokens(text).len())
    }

    fn load(self) -> Result<&'static CoreBPE, AskError> {
        let (cell, init): (&CachedBpe, fn() -> Result<CoreBPE, String>) = match self {
            Encoding::Cl100kBase => (&CL100K_BASE, || {
                tiktoken_rs::cl100k_base().map_err(|e| e.to_string())
            }),
            Encoding::P50kBase => (&P50K_BASE, || {
                tiktoken_rs::p50k_base().map_err(|e| e.to_string())
            }),
            Encoding::R50kBase => (&R50K_BASE, || {
                tiktoken_rs::r50k_base().map_err(|e| e.to_string())
            }),
        };

        cell.get_or_init(|| {
            debug!("Loading tokenizer encoding {self}");
            init()
        })
        .as_ref()
        .map_err(|e| AskError::Tokenization(format!("failed to load encoding {self}: {e}")))
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
