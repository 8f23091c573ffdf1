//! Taglex - PMI tag dictionaries and multi-resolution text scoring
//!
//! Builds, from raw word-occurrence statistics, one weighted dictionary per
//! (tag, n-gram size) using pointwise mutual information, and scores free
//! text against a tag's dictionaries at every resolution at once. Built
//! scorer sets live in a concurrent registry that swaps them in atomically
//! and allows at most one in-flight build per service.
//!
//! # Example
//!
//! ```
//! use taglex::{BuildPipeline, ScorerRegistry, StaticSource, Subset};
//!
//! let mut subset = Subset::new(1000, 50);
//! subset.insert("goal", 10, 100);
//! let mut source = StaticSource::new();
//! source.insert("sports", 1, subset);
//!
//! let registry = ScorerRegistry::new();
//! let pipeline = BuildPipeline::new(registry.clone());
//! pipeline.run(&source, "articles", &["sports".to_string()], &[1])?;
//!
//! let set = registry.get("articles").unwrap();
//! assert!(set["sports"].score("goal kick", 2.0, false) > 0.0);
//! # Ok::<(), taglex::TaglexError>(())
//! ```

pub mod artifact;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod ngram;
pub mod pipeline;
pub mod registry;
pub mod scorer;

pub use artifact::DictionaryArtifact;
pub use builder::{
    BuildOptions, BuildStats, Combine, CompressMode, CompressRule, DictionaryBuilder,
};
pub use config::EngineConfig;
pub use error::{TaglexError, TaglexResult};
pub use models::{Occurrence, Subset, TagDictionary, WordStat};
pub use ngram::make_ngrams;
pub use pipeline::{
    progress_percent, BuildPipeline, BuildReport, CancelToken, OccurrenceSource, ProgressCallback,
    StaticSource,
};
pub use registry::{BuildGuard, BuildState, ScorerRegistry};
pub use scorer::{ScorerSet, TagScorer};
