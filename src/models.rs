//! Core data models for taglex
//!
//! Raw occurrence counts come in per (tag, n-gram size) as a [`Subset`];
//! per-word statistics are derived from them during a build:
//!
//! ```text
//! prob_corpus = corpus_count / corpus_total
//! joint_prob  = tag_count   / corpus_total
//! prob_tag    = tag_total   / corpus_total
//! info_value  = -log2(prob_corpus)
//! pmi         = log2(joint_prob / (prob_corpus * prob_tag))
//! ```
//!
//! Statistics are ephemeral: computed per build, never persisted. Words
//! whose statistics cannot be computed finitely are division hazards and
//! are dropped (counted, logged) rather than poisoning the averages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{TaglexError, TaglexResult};

/// A tag dictionary maps an n-gram to its final weight.
pub type TagDictionary = HashMap<String, f64>;

/// Occurrence counts for one word: within the tag and in the whole corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(default)]
    pub tag_count: u64,
    #[serde(default)]
    pub corpus_count: u64,
}

impl Occurrence {
    pub fn new(tag_count: u64, corpus_count: u64) -> Self {
        Self {
            tag_count,
            corpus_count,
        }
    }

    /// `tag_count > corpus_count` is tolerated but worth flagging upstream.
    pub fn is_violation(&self) -> bool {
        self.tag_count > self.corpus_count
    }
}

/// Word-occurrence statistics for one (tag, n-gram size) pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subset {
    #[serde(default)]
    pub words: HashMap<String, Occurrence>,
    #[serde(default)]
    pub corpus_total: u64,
    #[serde(default)]
    pub tag_total: u64,
}

impl Subset {
    pub fn new(corpus_total: u64, tag_total: u64) -> Self {
        Self {
            words: HashMap::new(),
            corpus_total,
            tag_total,
        }
    }

    pub fn insert(&mut self, word: impl Into<String>, tag_count: u64, corpus_count: u64) {
        self.words
            .insert(word.into(), Occurrence::new(tag_count, corpus_count));
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Structural check: the tag cannot occur more often than the corpus.
    pub fn validate(&self) -> TaglexResult<()> {
        if self.tag_total > self.corpus_total {
            return Err(TaglexError::InvalidArgument(format!(
                "tag_total {} exceeds corpus_total {}",
                self.tag_total, self.corpus_total
            )));
        }
        Ok(())
    }
}

/// Derived statistics for one word. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordStat {
    pub prob_corpus: f64,
    pub joint_prob: f64,
    pub prob_tag: f64,
    pub info_value: f64,
    pub pmi: f64,
}

impl WordStat {
    /// Computes statistics for one word, or `None` when they are not
    /// finitely defined (zero corpus count, empty corpus, zero tag total,
    /// or a word never seen under the tag).
    pub fn compute(occ: &Occurrence, corpus_total: u64, tag_total: u64) -> Option<Self> {
        if corpus_total == 0 || occ.corpus_count == 0 || tag_total == 0 {
            return None;
        }
        let total = corpus_total as f64;
        let prob_corpus = occ.corpus_count as f64 / total;
        let joint_prob = occ.tag_count as f64 / total;
        let prob_tag = tag_total as f64 / total;
        let info_value = -prob_corpus.log2();
        let pmi = (joint_prob / (prob_corpus * prob_tag)).log2();
        if !pmi.is_finite() || !info_value.is_finite() {
            return None;
        }
        Some(Self {
            prob_corpus,
            joint_prob,
            prob_tag,
            info_value,
            pmi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmi_known_instance() {
        // joint = 0.01, prob_corpus = 0.1, prob_tag = 0.05 -> ratio 2.0
        let occ = Occurrence::new(10, 100);
        let stat = WordStat::compute(&occ, 1000, 50).unwrap();
        assert!((stat.pmi - 1.0).abs() < 1e-9);
        assert!((stat.info_value - 0.1f64.log2().abs()).abs() < 1e-9);
        assert!((stat.prob_tag - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_zero_corpus_count_is_hazard() {
        let occ = Occurrence::new(5, 0);
        assert!(WordStat::compute(&occ, 1000, 50).is_none());
    }

    #[test]
    fn test_zero_corpus_total_is_hazard() {
        let occ = Occurrence::new(5, 10);
        assert!(WordStat::compute(&occ, 0, 0).is_none());
    }

    #[test]
    fn test_unseen_under_tag_is_hazard() {
        // joint_prob = 0 -> pmi = -inf, not finitely defined
        let occ = Occurrence::new(0, 10);
        assert!(WordStat::compute(&occ, 1000, 50).is_none());
    }

    #[test]
    fn test_subset_validate_rejects_inverted_totals() {
        let subset = Subset::new(100, 200);
        assert!(subset.validate().is_err());
        let subset = Subset::new(200, 200);
        assert!(subset.validate().is_ok());
    }

    #[test]
    fn test_occurrence_violation_flag() {
        assert!(Occurrence::new(10, 5).is_violation());
        assert!(!Occurrence::new(5, 10).is_violation());
    }
}
