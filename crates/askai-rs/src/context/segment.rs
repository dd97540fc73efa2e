//! Sentence segmentation.
//!
//! Text is cut after every terminal marker. The cuts are exact: every byte
//! of the input lands in exactly one piece, so concatenating the sentences
//! and the unterminated tail reproduces the input.

/// Terminal markers, longest first so that `...` wins over a lone `.`.
pub const SENTENCE_TERMINATORS: [&str; 4] = ["...", ".", "!", "?"];

/// The result of segmenting a text: terminated sentences plus whatever
/// trails the last terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentences<'a> {
    /// Sentences that end with a terminal marker, in input order.
    pub terminated: Vec<&'a str>,
    /// Unterminated text after the last marker. Empty if the text ends
    /// with a marker. Equal to the whole input if it has no marker.
    pub tail: &'a str,
}

impl<'a> Sentences<'a> {
    /// Whether the input contained no terminal marker at all.
    pub fn is_unterminated(&self) -> bool {
        self.terminated.is_empty()
    }

    /// All pieces of the input in order: the terminated sentences followed
    /// by the tail when it is non-empty.
    pub fn pieces(&self) -> Vec<&'a str> {
        let mut pieces = self.terminated.clone();
        if !self.tail.is_empty() {
            pieces.push(self.tail);
        }
        pieces
    }
}

/// Split `text` into terminated sentences.
///
/// Scans left to right; at each position the remaining suffix is tested
/// against [`SENTENCE_TERMINATORS`] in order and the first match closes a
/// sentence running from the previous cut through the end of the marker.
/// A run of punctuation such as `"?!?"` therefore yields one sentence per
/// marker.
pub fn split_sentences(text: &str) -> Sentences<'_> {
    let mut terminated = Vec::new();
    let mut cut = 0;
    let mut pos = 0;

    while let Some(rest) = text.get(pos..) {
        let Some(c) = rest.chars().next() else {
            break;
        };

        match SENTENCE_TERMINATORS
            .iter()
            .find(|marker| rest.starts_with(*marker))
        {
            Some(marker) => {
                let end = pos + marker.len();
                if let Some(sentence) = text.get(cut..end) {
                    terminated.push(sentence);
                }
                cut = end;
                pos = end;
            }
            None => pos += c.len_utf8(),
        }
    }

    Sentences {
        terminated,
        tail: text.get(cut..).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(s: &Sentences<'_>) -> String {
        s.pieces().concat()
    }

    #[test]
    fn two_sentences_without_spaces() {
        let s = split_sentences("Sentence one.Sentence two.");
        assert_eq!(s.terminated, vec!["Sentence one.", "Sentence two."]);
        assert_eq!(s.tail, "");
    }

    #[test]
    fn empty_text_has_no_sentences() {
        let s = split_sentences("");
        assert!(s.terminated.is_empty());
        assert!(s.pieces().is_empty());
    }

    #[test]
    fn text_without_markers_is_all_tail() {
        let s = split_sentences("just a fragment");
        assert!(s.is_unterminated());
        assert_eq!(s.tail, "just a fragment");
        assert_eq!(s.pieces(), vec!["just a fragment"]);
    }

    #[test]
    fn ellipsis_is_one_marker() {
        let s = split_sentences("Wait... what?");
        assert_eq!(s.terminated, vec!["Wait...", " what?"]);

        let s = split_sentences("...");
        assert_eq!(s.terminated, vec!["..."]);
    }

    #[test]
    fn four_dots_are_ellipsis_then_dot() {
        let s = split_sentences("Hm....");
        assert_eq!(s.terminated, vec!["Hm...", "."]);
    }

    #[test]
    fn pure_punctuation_splits_per_marker() {
        let s = split_sentences("?????!!!!!");
        assert_eq!(s.terminated.len(), 10);
        assert!(s.terminated.iter().all(|p| p.len() == 1));
    }

    #[test]
    fn trailing_fragment_is_kept_in_tail() {
        let text = "First. Second! and then";
        let s = split_sentences(text);
        assert_eq!(s.terminated, vec!["First.", " Second!"]);
        assert_eq!(s.tail, " and then");
        assert_eq!(rebuild(&s), text);
    }

    #[test]
    fn multibyte_text_round_trips() {
        let text = "Привет мир. Как дела?Всё хорошо… 好的!";
        let s = split_sentences(text);
        assert_eq!(rebuild(&s), text);
        assert_eq!(s.terminated.len(), 3);
    }

    #[test]
    fn messy_punctuation_round_trips() {
        let text = "Some texts could be terrible with punctuation!!!Like this..........."
            .to_string()
            + "But what about that??????Oooo!!!???;;;!!....???So terrible.......!!!!!";
        let s = split_sentences(&text);
        assert_eq!(rebuild(&s), text);
    }
}
