//! Multi-resolution text scoring
//!
//! A [`TagScorer`] holds one weighted dictionary per n-gram size for a
//! single tag and scores free text against all of them, largest size
//! first. Exact phrase matches are absorbed at the top resolution;
//! whatever misses is broken into smaller windows and re-matched at the
//! next resolution down, so a scorer degrades from phrase-level to
//! single-word matching instead of failing outright on novel phrasing.
//!
//! # Scoring
//!
//! ```text
//! level n:  local = Σ matched d[w] * multiplier^(n-1)
//!           unmatched windows decompose into (n-1)-word windows
//!           and fall through to the next configured size
//!
//! score = recurse(windows, sizes) / len(windows)
//! denom = max(1.0, max_k( max_weight[k] * multiplier^(k-1) * 2^(max_n-k) ))
//! ```
//!
//! Sentinels: empty text scores `0.0`; a scorer whose dictionaries are all
//! empty scores `-1.0` ("no information for this tag") for any other text.

use std::collections::HashMap;

use crate::error::{TaglexError, TaglexResult};
use crate::models::TagDictionary;
use crate::ngram::make_ngrams;

/// All scorers for one service, keyed by tag id.
pub type ScorerSet = HashMap<String, TagScorer>;

/// Per-tag scorer over one dictionary per n-gram size.
///
/// Immutable once built; a rebuild replaces the whole value.
#[derive(Debug, Clone)]
pub struct TagScorer {
    dictionaries: HashMap<u32, TagDictionary>,
    max_weights: HashMap<u32, f64>,
    /// Configured sizes, largest first.
    sizes: Vec<u32>,
}

impl TagScorer {
    pub fn new(dictionaries: HashMap<u32, TagDictionary>) -> TaglexResult<Self> {
        if dictionaries.contains_key(&0) {
            return Err(TaglexError::InvalidArgument(
                "n-gram size must be positive".to_string(),
            ));
        }
        let mut sizes: Vec<u32> = dictionaries.keys().copied().collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        let max_weights = dictionaries
            .iter()
            .map(|(&size, dict)| (size, dict.values().copied().fold(0.0f64, f64::max)))
            .collect();
        Ok(Self {
            dictionaries,
            max_weights,
            sizes,
        })
    }

    /// Configured n-gram sizes, largest first.
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Largest weight at `size`, 0.0 for an empty or absent dictionary.
    pub fn max_weight(&self, size: u32) -> f64 {
        self.max_weights.get(&size).copied().unwrap_or(0.0)
    }

    pub fn dictionaries(&self) -> &HashMap<u32, TagDictionary> {
        &self.dictionaries
    }

    /// True when every dictionary is empty; such a scorer carries no signal.
    pub fn is_empty(&self) -> bool {
        self.dictionaries.values().all(|dict| dict.is_empty())
    }

    /// Scores `text` against all resolutions. Infallible: degenerate inputs
    /// map onto the sentinels instead of errors.
    pub fn score(&self, text: &str, n_gram_multiplier: f64, normalized: bool) -> f64 {
        if text.split(' ').all(str::is_empty) {
            return 0.0;
        }
        if self.is_empty() {
            return -1.0;
        }

        // Largest size whose tokenization is non-empty wins; text shorter
        // than every configured size scores like empty text.
        let mut initial_words: Vec<String> = Vec::new();
        let mut max_n = 0u32;
        for &size in &self.sizes {
            let words = make_ngrams(text, size, false).unwrap_or_default();
            if !words.is_empty() {
                initial_words = words;
                max_n = size;
                break;
            }
        }
        if initial_words.is_empty() {
            return 0.0;
        }

        let effective: Vec<u32> = self.sizes.iter().copied().filter(|&s| s <= max_n).collect();
        let raw = self.recurse(&initial_words, &effective, n_gram_multiplier);
        let mut score = raw / initial_words.len() as f64;

        if normalized {
            let denom = effective
                .iter()
                .map(|&k| {
                    self.max_weight(k)
                        * n_gram_multiplier.powi(k as i32 - 1)
                        * 2f64.powi((max_n - k) as i32)
                })
                .fold(1.0f64, f64::max);
            score /= denom;
        }
        score
    }

    fn recurse(&self, words: &[String], remaining_sizes: &[u32], multiplier: f64) -> f64 {
        let Some((&n, rest)) = remaining_sizes.split_first() else {
            return 0.0;
        };
        let Some(dict) = self.dictionaries.get(&n) else {
            return 0.0;
        };
        if dict.is_empty() {
            return 0.0;
        }

        let level_factor = multiplier.powi(n as i32 - 1);
        let mut local = 0.0;
        let mut unmatched: Vec<&String> = Vec::new();
        for word in words {
            match dict.get(word) {
                Some(weight) => local += weight * level_factor,
                None => unmatched.push(word),
            }
        }

        if rest.is_empty() || unmatched.is_empty() {
            return local;
        }

        // Distinct positive sizes mean n >= 2 whenever sizes remain below.
        let mut decomposed: Vec<String> = Vec::new();
        for word in unmatched {
            decomposed.extend(make_ngrams(word, n - 1, true).unwrap_or_default());
        }
        local + self.recurse(&decomposed, rest, multiplier)
    }
}
