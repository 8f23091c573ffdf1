//! Engine configuration
//!
//! One TOML file drives a build/score run: which n-gram sizes to cover,
//! which dictionary filters to apply, and how scoring is parameterized.
//! Every field has a default, so an absent or empty file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::builder::{BuildOptions, CompressRule};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub scoring: ScoringSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSection {
    /// N-gram sizes covered by builds and scoring.
    #[serde(default = "default_sizes")]
    pub ngram_sizes: Vec<u32>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            ngram_sizes: default_sizes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildSection {
    #[serde(default = "default_true")]
    pub drop_non_positive_pmi: bool,
    #[serde(default)]
    pub drop_below_average_pmi: bool,
    #[serde(default)]
    pub compress: Option<CompressRule>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            drop_non_positive_pmi: true,
            drop_below_average_pmi: false,
            compress: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringSection {
    /// Per-level weight multiplier raised to (size - 1).
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_true")]
    pub normalized: bool,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            multiplier: default_multiplier(),
            normalized: true,
        }
    }
}

fn default_sizes() -> Vec<u32> {
    vec![1, 2, 3]
}

fn default_true() -> bool {
    true
}

fn default_multiplier() -> f64 {
    2.0
}

impl EngineConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sizes = &self.engine.ngram_sizes;
        if sizes.is_empty() {
            anyhow::bail!("ngram_sizes must list at least one size");
        }
        if sizes.contains(&0) {
            anyhow::bail!("ngram_sizes must be positive");
        }
        let mut deduped = sizes.clone();
        deduped.sort_unstable();
        deduped.dedup();
        if deduped.len() != sizes.len() {
            anyhow::bail!("ngram_sizes contains duplicates");
        }
        Ok(())
    }

    pub fn sizes(&self) -> &[u32] {
        &self.engine.ngram_sizes
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            drop_non_positive_pmi: self.build.drop_non_positive_pmi,
            drop_below_average_pmi: self.build.drop_below_average_pmi,
            compress: self.build.compress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Combine, CompressMode};

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.sizes(), &[1, 2, 3]);
        assert!(config.build.drop_non_positive_pmi);
        assert!(!config.build.drop_below_average_pmi);
        assert!(config.build.compress.is_none());
        assert_eq!(config.scoring.multiplier, 2.0);
        assert!(config.scoring.normalized);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing_minimal() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.sizes(), &[1, 2, 3]);
        assert!(config.build.drop_non_positive_pmi);
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml_str = r#"
[engine]
ngram_sizes = [1, 2]

[build]
drop_non_positive_pmi = false
drop_below_average_pmi = true

[build.compress]
max_tag_occ = 1
max_corpus_occ = 2
combine = "or"
mode = "drop_common"

[scoring]
multiplier = 3.0
normalized = false
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sizes(), &[1, 2]);
        let options = config.build_options();
        assert!(!options.drop_non_positive_pmi);
        assert!(options.drop_below_average_pmi);
        let rule = options.compress.unwrap();
        assert_eq!(rule.max_tag_occ, 1);
        assert_eq!(rule.max_corpus_occ, 2);
        assert_eq!(rule.combine, Combine::Or);
        assert_eq!(rule.mode, CompressMode::DropCommon);
        assert_eq!(config.scoring.multiplier, 3.0);
        assert!(!config.scoring.normalized);
    }

    #[test]
    fn test_compress_defaults_to_and_drop_rare() {
        let toml_str = r#"
[build.compress]
max_tag_occ = 5
max_corpus_occ = 10
"#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        let rule = config.build.compress.unwrap();
        assert_eq!(rule.combine, Combine::And);
        assert_eq!(rule.mode, CompressMode::DropRare);
    }

    #[test]
    fn test_validation_rejects_bad_sizes() {
        let mut config = EngineConfig::default();
        config.engine.ngram_sizes = vec![];
        assert!(config.validate().is_err());
        config.engine.ngram_sizes = vec![0, 1];
        assert!(config.validate().is_err());
        config.engine.ngram_sizes = vec![2, 2];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taglex.toml");
        std::fs::write(&path, "[engine]\nngram_sizes = [1, 2]\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.sizes(), &[1, 2]);

        assert!(EngineConfig::load(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taglex.toml");
        std::fs::write(&path, "this is [[ not valid toml {{{}}}").unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }
}
