//! Word-window n-gram extraction
//!
//! Words are space-separated tokens; empty tokens from repeated, leading,
//! or trailing spaces are discarded before windowing, and windows are
//! rejoined with a single space. The tokenizer has no opinion about
//! casing or punctuation; callers normalize text upstream.

use crate::error::{TaglexError, TaglexResult};

/// Extracts contiguous `size`-word n-grams from `text`, left to right.
///
/// With `include_shorter`, text shorter than `size` words yields the single
/// window of all its words, and longer text additionally yields one trailing
/// partial window of the final `size - 1` words. Without it, short text
/// yields nothing and only full windows are produced.
pub fn make_ngrams(text: &str, size: u32, include_shorter: bool) -> TaglexResult<Vec<String>> {
    if size == 0 {
        return Err(TaglexError::InvalidArgument(
            "n-gram size must be positive".to_string(),
        ));
    }
    let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }
    let size = size as usize;
    if words.len() < size {
        if include_shorter {
            return Ok(vec![words.join(" ")]);
        }
        return Ok(Vec::new());
    }
    let mut ngrams: Vec<String> = words.windows(size).map(|w| w.join(" ")).collect();
    if include_shorter && size > 1 {
        ngrams.push(words[words.len() - size + 1..].join(" "));
    }
    Ok(ngrams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bigrams_from_three_words() {
        let grams = make_ngrams("a b c", 2, false).unwrap();
        assert_eq!(grams, vec!["a b", "b c"]);
    }

    #[test]
    fn test_short_text_without_shorter_is_empty() {
        let grams = make_ngrams("a", 2, false).unwrap();
        assert!(grams.is_empty());
    }

    #[test]
    fn test_short_text_with_shorter_keeps_all_words() {
        let grams = make_ngrams("a", 2, true).unwrap();
        assert_eq!(grams, vec!["a"]);
        let grams = make_ngrams("a b", 3, true).unwrap();
        assert_eq!(grams, vec!["a b"]);
    }

    #[test]
    fn test_trailing_partial_window() {
        let grams = make_ngrams("a b c", 2, true).unwrap();
        assert_eq!(grams, vec!["a b", "b c", "c"]);
        let grams = make_ngrams("a b c d", 3, true).unwrap();
        assert_eq!(grams, vec!["a b c", "b c d", "c d"]);
    }

    #[test]
    fn test_unigrams() {
        let grams = make_ngrams("a b c", 1, false).unwrap();
        assert_eq!(grams, vec!["a", "b", "c"]);
        // size 1 has no partial window to add
        let grams = make_ngrams("a b c", 1, true).unwrap();
        assert_eq!(grams, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_whitespace_runs_are_ignored() {
        let grams = make_ngrams("  a   b c ", 2, false).unwrap();
        assert_eq!(grams, vec!["a b", "b c"]);
    }

    #[test]
    fn test_empty_and_blank_text() {
        assert!(make_ngrams("", 2, false).unwrap().is_empty());
        assert!(make_ngrams("   ", 2, true).unwrap().is_empty());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(make_ngrams("a b", 0, false).is_err());
    }

    #[test]
    fn test_exact_length_with_shorter() {
        let grams = make_ngrams("a b", 2, true).unwrap();
        assert_eq!(grams, vec!["a b", "b"]);
    }
}
