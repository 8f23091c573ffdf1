//! PMI dictionary construction
//!
//! Turns one [`Subset`] of raw counts into a weighted [`TagDictionary`].
//! The filter chain runs in a fixed order: division hazards, the
//! non-positive PMI filter, the below-average PMI filter (which recomputes
//! the average over its survivors), the occurrence compressor, and finally
//! weighting:
//!
//! ```text
//! rxy    = avg_pmi / info_value
//! weight = pmi / rxy = pmi * info_value / avg_pmi
//! ```
//!
//! The average in the weighting step is the most recently computed one.
//! Hazard words (undefined statistics, zero information value, or an
//! all-zero average) are dropped and counted, never guessed at.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TaglexResult;
use crate::models::{Occurrence, Subset, TagDictionary, WordStat};

/// Whether both occurrence thresholds must hit, or either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    #[default]
    And,
    Or,
}

/// Which side of the occurrence thresholds gets dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressMode {
    /// Drop words at or below the thresholds (rare words are noise).
    #[default]
    DropRare,
    /// Drop words above the thresholds (stop-word style pruning).
    DropCommon,
}

/// Occurrence-count compressor applied after the PMI filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressRule {
    pub max_tag_occ: u64,
    pub max_corpus_occ: u64,
    #[serde(default)]
    pub combine: Combine,
    #[serde(default)]
    pub mode: CompressMode,
}

impl CompressRule {
    fn drops(&self, occ: &Occurrence) -> bool {
        let (tag_hit, corpus_hit) = match self.mode {
            CompressMode::DropRare => (
                occ.tag_count <= self.max_tag_occ,
                occ.corpus_count <= self.max_corpus_occ,
            ),
            CompressMode::DropCommon => (
                occ.tag_count > self.max_tag_occ,
                occ.corpus_count > self.max_corpus_occ,
            ),
        };
        match self.combine {
            Combine::And => tag_hit && corpus_hit,
            Combine::Or => tag_hit || corpus_hit,
        }
    }
}

/// Filter switches for one dictionary build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOptions {
    pub drop_non_positive_pmi: bool,
    pub drop_below_average_pmi: bool,
    pub compress: Option<CompressRule>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            drop_non_positive_pmi: true,
            drop_below_average_pmi: false,
            compress: None,
        }
    }
}

/// Counters describing what one build kept and dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStats {
    pub input_words: usize,
    pub kept_words: usize,
    pub hazard_words: usize,
    pub dropped_non_positive: usize,
    pub dropped_below_average: usize,
    pub dropped_compressed: usize,
    pub count_violations: usize,
}

impl BuildStats {
    pub fn summary(&self) -> String {
        format!(
            "{} words in, {} kept ({} hazard, {} non-positive, {} below-average, {} compressed)",
            self.input_words,
            self.kept_words,
            self.hazard_words,
            self.dropped_non_positive,
            self.dropped_below_average,
            self.dropped_compressed
        )
    }

    pub fn merge(&mut self, other: &BuildStats) {
        self.input_words += other.input_words;
        self.kept_words += other.kept_words;
        self.hazard_words += other.hazard_words;
        self.dropped_non_positive += other.dropped_non_positive;
        self.dropped_below_average += other.dropped_below_average;
        self.dropped_compressed += other.dropped_compressed;
        self.count_violations += other.count_violations;
    }
}

/// Builds weighted tag dictionaries from occurrence subsets.
#[derive(Debug, Clone, Default)]
pub struct DictionaryBuilder {
    options: BuildOptions,
}

impl DictionaryBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn build(&self, subset: &Subset) -> TaglexResult<TagDictionary> {
        self.build_with_stats(subset).map(|(dict, _)| dict)
    }

    pub fn build_with_stats(&self, subset: &Subset) -> TaglexResult<(TagDictionary, BuildStats)> {
        subset.validate()?;
        let mut stats = BuildStats {
            input_words: subset.words.len(),
            ..Default::default()
        };

        let mut scored: Vec<(&str, &Occurrence, WordStat)> = Vec::with_capacity(subset.len());
        for (word, occ) in &subset.words {
            if occ.is_violation() {
                stats.count_violations += 1;
                warn!(
                    "Word '{}' counted {} times under the tag but {} in the corpus",
                    word, occ.tag_count, occ.corpus_count
                );
            }
            match WordStat::compute(occ, subset.corpus_total, subset.tag_total) {
                Some(stat) => scored.push((word.as_str(), occ, stat)),
                None => {
                    stats.hazard_words += 1;
                    debug!("Dropping word '{}' with undefined statistics", word);
                }
            }
        }

        if self.options.drop_non_positive_pmi {
            let before = scored.len();
            scored.retain(|(_, _, stat)| stat.pmi > 0.0);
            stats.dropped_non_positive = before - scored.len();
        }

        let mut avg_pmi = mean_pmi(&scored);

        if self.options.drop_below_average_pmi {
            let before = scored.len();
            let cutoff = avg_pmi;
            scored.retain(|(_, _, stat)| stat.pmi > cutoff);
            stats.dropped_below_average = before - scored.len();
            // weights use the average over the words that survived the cut
            avg_pmi = mean_pmi(&scored);
        }

        if let Some(rule) = &self.options.compress {
            let before = scored.len();
            scored.retain(|(_, occ, _)| !rule.drops(occ));
            stats.dropped_compressed = before - scored.len();
        }

        let mut dict = TagDictionary::with_capacity(scored.len());
        if scored.is_empty() {
            return Ok((dict, stats));
        }
        if avg_pmi == 0.0 {
            stats.hazard_words += scored.len();
            warn!(
                "Average PMI is zero across {} surviving words; no weights are defined",
                scored.len()
            );
            return Ok((dict, stats));
        }
        for (word, _, stat) in scored {
            if stat.info_value == 0.0 {
                stats.hazard_words += 1;
                debug!("Dropping corpus-saturated word '{}'", word);
                continue;
            }
            let rxy = avg_pmi / stat.info_value;
            dict.insert(word.to_string(), stat.pmi / rxy);
        }
        stats.kept_words = dict.len();
        Ok((dict, stats))
    }
}

fn mean_pmi(scored: &[(&str, &Occurrence, WordStat)]) -> f64 {
    if scored.is_empty() {
        return 0.0;
    }
    scored.iter().map(|(_, _, stat)| stat.pmi).sum::<f64>() / scored.len() as f64
}
