//! Fitting a message into a model's input window.
//!
//! Leaf-first:
//!
//! 1. **[`segment`]** splits text into sentences that reproduce the input
//!    exactly when concatenated.
//! 2. **[`chunk`]** packs consecutive sentences into token-bounded chunks
//!    without ever cutting a sentence.
//! 3. **[`budget`]** divides a model window between the prompt and the
//!    context, and sizes summarization blocks.
//! 4. **[`summarizer`]** asks the model to summarize chunks in order.
//! 5. **[`compactor`]** ties the above into the check / split / shorten
//!    loop that the [`Dispatcher`](crate::dispatch::Dispatcher) runs before
//!    every over-budget call.

pub mod budget;
pub mod chunk;
pub mod compactor;
pub mod segment;
pub mod summarizer;

pub use budget::BudgetSplit;
pub use chunk::{pack_sentences, split_text};
pub use compactor::Compactor;
pub use segment::{Sentences, split_sentences};
pub use summarizer::{DEFAULT_MAX_SUMMARY_DEPTH, SummarizerConfig};
