//! Greedy packing of sentences into token-bounded chunks.
//!
//! Chunks preserve sentence order and never split a sentence, so a sentence
//! that alone exceeds the limit becomes its own oversized chunk.

use tracing::trace;

use super::segment::split_sentences;
use crate::error::AskError;

/// Pack consecutive `sentences` into chunks of at most `token_limit`
/// tokens, as measured by `count`.
///
/// A limit of 0 yields no chunks. Concatenating the returned chunks in
/// order reproduces the concatenation of the input sentences.
pub fn pack_sentences<F>(
    sentences: &[&str],
    token_limit: usize,
    mut count: F,
) -> Result<Vec<String>, AskError>
where
    F: FnMut(&str) -> Result<usize, AskError>,
{
    if token_limit == 0 {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut chunk_tokens = 0usize;

    for sentence in sentences {
        let tokens = count(sentence)?;

        if chunk_tokens + tokens > token_limit {
            if !chunk.is_empty() {
                chunks.push(std::mem::take(&mut chunk));
            }
            chunk.push_str(sentence);
            chunk_tokens = tokens;
        } else {
            chunk.push_str(sentence);
            chunk_tokens += tokens;
        }
    }

    if !chunk.is_empty() {
        chunks.push(chunk);
    }

    trace!(
        "Packed {} sentence(s) into {} chunk(s) of <= {token_limit} tokens",
        sentences.len(),
        chunks.len()
    );
    Ok(chunks)
}

/// Split `text` into sentence-aligned chunks of at most `token_limit`
/// tokens each.
///
/// - a limit of 0, or text that counts as 0 tokens, yields no chunks;
/// - text without any sentence terminator is returned as a single chunk;
/// - otherwise the terminated sentences and the trailing fragment are
///   packed with [`pack_sentences`].
pub fn split_text<F>(text: &str, token_limit: usize, mut count: F) -> Result<Vec<String>, AskError>
where
    F: FnMut(&str) -> Result<usize, AskError>,
{
    if token_limit == 0 || count(text)? == 0 {
        return Ok(Vec::new());
    }

    let sentences = split_sentences(text);
    if sentences.is_unterminated() {
        return Ok(vec![text.to_string()]);
    }

    pack_sentences(&sentences.pieces(), token_limit, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::estimate_tokens_roughly;

    fn rough(text: &str) -> Result<usize, AskError> {
        Ok(estimate_tokens_roughly(text))
    }

    #[test]
    fn one_sentence_fits_in_one_chunk() {
        let text = "One sentence.";
        let parts = split_text(text, estimate_tokens_roughly(text), rough).unwrap();
        assert_eq!(parts, vec![text]);
    }

    #[test]
    fn halves_limit_gives_two_chunks() {
        let (s1, s2) = ("Sentence one.", "Sentence two.");
        let text = format!("{s1}{s2}");
        let parts = split_text(&text, estimate_tokens_roughly(&text) / 2, rough).unwrap();
        assert_eq!(parts, vec![s1, s2]);
    }

    #[test]
    fn thirds_limit_gives_three_chunks() {
        let (s1, s2, s3) = ("Sentence one.", "Sentence two.", "Sentence three.");
        let text = format!("{s1}{s2}{s3}");
        let parts = split_text(&text, estimate_tokens_roughly(&text) / 3, rough).unwrap();
        assert_eq!(parts, vec![s1, s2, s3]);
    }

    #[test]
    fn five_sentences_five_chunks() {
        let sentences = [
            "How do I pass text with size larger than model input?",
            "Split it into multiple parts!",
            "Then pass each part to model for summarization.",
            "Then concatenate all parts together.",
            "Be like map-reduce...",
        ];
        let text = sentences.concat();
        let parts = split_text(&text, estimate_tokens_roughly(&text) / 5, rough).unwrap();
        assert_eq!(parts, sentences);
    }

    #[test]
    fn messy_punctuation_reconstructs_input() {
        let text = "Some texts could be terrible with punctuation!!!Like this...........".to_string()
            + "But what about that??????Oooo!!!???;;;!!....???So terrible.......!!!!!";
        let parts = split_text(&text, estimate_tokens_roughly(&text) / 4, rough).unwrap();
        assert!(parts.len() > 1);
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn only_punctuation_gives_one_chunk_per_marker() {
        let text = "?????!!!!!";
        let parts = split_text(text, 1, rough).unwrap();
        assert_eq!(parts.len(), text.len());
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn degenerate_inputs_yield_nothing() {
        assert!(split_text("", 10, rough).unwrap().is_empty());
        assert!(split_text("text", 0, rough).unwrap().is_empty());
        assert!(pack_sentences(&[], 10, rough).unwrap().is_empty());
        assert!(pack_sentences(&["One.", "Two."], 0, rough).unwrap().is_empty());
    }

    #[test]
    fn unterminated_text_is_one_chunk() {
        assert_eq!(split_text("word", 10, rough).unwrap(), vec!["word"]);
        assert_eq!(split_text("...", 10, rough).unwrap(), vec!["..."]);
    }

    #[test]
    fn trailing_fragment_is_not_dropped() {
        let text = "First sentence. Second sentence. and a fragment";
        let parts = split_text(text, 6, rough).unwrap();
        assert_eq!(parts.concat(), text);
        assert_eq!(parts.last().map(String::as_str), Some(" and a fragment"));
    }

    #[test]
    fn oversized_sentence_becomes_its_own_chunk() {
        let long = "This sentence is much longer than the tiny limit allows.";
        let parts = pack_sentences(&["Hi.", long, "Bye."], 3, rough).unwrap();
        assert_eq!(parts, vec!["Hi.", long, "Bye."]);
    }

    #[test]
    fn count_errors_propagate() {
        let failing = |_: &str| -> Result<usize, AskError> {
            Err(AskError::Tokenization("boom".into()))
        };
        assert!(split_text("One. Two.", 5, failing).is_err());
    }
}
