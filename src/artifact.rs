//! Dictionary artifact schema and I/O
//!
//! The durable form of a committed scorer set: one JSON document holding
//! every tag's dictionaries keyed by n-gram size. Only the dictionaries
//! are persisted; max weights and size ordering are derived again on load.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{TaglexError, TaglexResult};
use crate::models::TagDictionary;
use crate::scorer::{ScorerSet, TagScorer};

/// Serialized dictionaries for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryArtifact {
    pub version: u32,
    /// RFC 3339 build timestamp.
    pub generated_at: String,
    pub service_id: String,
    /// tag id -> n-gram size -> dictionary
    pub tags: HashMap<String, HashMap<u32, TagDictionary>>,
}

impl DictionaryArtifact {
    pub const VERSION: u32 = 1;

    pub fn from_scorers(service_id: &str, scorers: &ScorerSet) -> Self {
        let tags = scorers
            .iter()
            .map(|(tag, scorer)| (tag.clone(), scorer.dictionaries().clone()))
            .collect();
        Self {
            version: Self::VERSION,
            generated_at: Utc::now().to_rfc3339(),
            service_id: service_id.to_string(),
            tags,
        }
    }

    /// Rebuilds the scorer set this artifact was exported from.
    pub fn into_scorers(self) -> TaglexResult<ScorerSet> {
        self.tags
            .into_iter()
            .map(|(tag, dicts)| Ok((tag, TagScorer::new(dicts)?)))
            .collect()
    }

    pub fn save(&self, path: &Path) -> TaglexResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> TaglexResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&data)?;
        if artifact.version != Self::VERSION {
            return Err(TaglexError::InvalidArgument(format!(
                "unsupported dictionary artifact version {} (expected {})",
                artifact.version,
                Self::VERSION
            )));
        }
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> ScorerSet {
        let mut bigrams = TagDictionary::new();
        bigrams.insert("red apple".to_string(), 3.0);
        let mut unigrams = TagDictionary::new();
        unigrams.insert("banana".to_string(), 1.0);
        let mut dicts = HashMap::new();
        dicts.insert(2u32, bigrams);
        dicts.insert(1u32, unigrams);
        let mut set = ScorerSet::new();
        set.insert("fruit".to_string(), TagScorer::new(dicts).unwrap());
        set
    }

    #[test]
    fn test_round_trip_preserves_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dicts.json");
        let set = sample_set();
        let expected = set["fruit"].score("red apple banana", 2.0, true);

        DictionaryArtifact::from_scorers("articles", &set)
            .save(&path)
            .unwrap();
        let loaded = DictionaryArtifact::load(&path).unwrap();
        assert_eq!(loaded.service_id, "articles");
        let restored = loaded.into_scorers().unwrap();
        let actual = restored["fruit"].score("red apple banana", 2.0, true);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dicts.json");
        let mut artifact = DictionaryArtifact::from_scorers("articles", &sample_set());
        artifact.version = 99;
        let json = serde_json::to_string(&artifact).unwrap();
        std::fs::write(&path, json).unwrap();

        let err = DictionaryArtifact::load(&path).unwrap_err();
        assert!(matches!(err, TaglexError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DictionaryArtifact::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TaglexError::Io(_)));
    }
}
