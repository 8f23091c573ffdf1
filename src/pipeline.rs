//! Parallel dictionary build pipeline
//!
//! A build walks every (tag, n-gram size) unit, pulls that unit's counts
//! from an [`OccurrenceSource`], and builds one dictionary per unit on a
//! rayon pool. Units are independent; the atomic registry commit at the
//! end is the only serialization point. Cancellation is cooperative and
//! checked between units, so a cancelled or failed build never becomes
//! visible to readers.

use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use serde::{Deserialize, Serialize};

use crate::builder::{BuildOptions, BuildStats, DictionaryBuilder};
use crate::error::{TaglexError, TaglexResult};
use crate::models::{Subset, TagDictionary};
use crate::registry::ScorerRegistry;
use crate::scorer::{ScorerSet, TagScorer};

/// Supplies occurrence counts for one (tag, n-gram size) pair.
///
/// Implementations typically wrap a search-index aggregation; the crate
/// only consumes the resulting counts.
pub trait OccurrenceSource: Send + Sync {
    fn fetch(&self, tag: &str, size: u32) -> anyhow::Result<Subset>;
}

/// In-memory occurrence source for tests and counts files.
///
/// A missing (tag, size) pair yields an empty subset rather than an
/// error: absent data means no occurrences, not a broken source.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    subsets: HashMap<(String, u32), Subset>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, size: u32, subset: Subset) {
        self.subsets.insert((tag.into(), size), subset);
    }

    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }
}

impl OccurrenceSource for StaticSource {
    fn fetch(&self, tag: &str, size: u32) -> anyhow::Result<Subset> {
        Ok(self
            .subsets
            .get(&(tag.to_string(), size))
            .cloned()
            .unwrap_or_default())
    }
}

/// Cooperative cancellation signal shared between a build and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Progress callback invoked after every completed unit with
/// (completed_units, total_units).
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Fractional progress as a percentage clamped to [0, 100].
pub fn progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (completed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// What one build run processed and committed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildReport {
    pub service_id: String,
    pub units_total: usize,
    pub units_built: usize,
    pub tags: usize,
    pub stats: BuildStats,
    pub duration_ms: u64,
}

impl BuildReport {
    pub fn summary(&self) -> String {
        format!(
            "service '{}': {} tags from {} units in {}ms; {}",
            self.service_id,
            self.tags,
            self.units_built,
            self.duration_ms,
            self.stats.summary()
        )
    }
}

/// Orchestrates dictionary builds across (tag, n-gram size) units.
pub struct BuildPipeline {
    registry: ScorerRegistry,
    builder: DictionaryBuilder,
    /// Number of worker threads for parallel execution
    workers: usize,
    /// Progress callback for reporting build status
    progress_callback: Option<ProgressCallback>,
    cancel_token: CancelToken,
}

impl BuildPipeline {
    /// Create a new build pipeline over `registry`.
    ///
    /// Worker count auto-detects from available parallelism; override with
    /// [`BuildPipeline::with_workers`].
    pub fn new(registry: ScorerRegistry) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4)
            .min(16);
        Self {
            registry,
            builder: DictionaryBuilder::default(),
            workers,
            progress_callback: None,
            cancel_token: CancelToken::new(),
        }
    }

    /// Set the worker thread count (0 = auto-detect).
    pub fn with_workers(mut self, workers: usize) -> Self {
        if workers > 0 {
            self.workers = workers;
        }
        self
    }

    /// Set the filter options applied to every unit.
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.builder = DictionaryBuilder::new(options);
        self
    }

    /// Set a progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Share a cancellation token with the build's owner.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Builds dictionaries for every (tag, size) unit and commits the new
    /// scorer set atomically. On cancellation or failure the previously
    /// committed set stays in effect.
    pub fn run(
        &self,
        source: &dyn OccurrenceSource,
        service_id: &str,
        tags: &[String],
        sizes: &[u32],
    ) -> TaglexResult<BuildReport> {
        let start = Instant::now();
        if sizes.is_empty() {
            return Err(TaglexError::InvalidArgument(
                "at least one n-gram size is required".to_string(),
            ));
        }
        if sizes.contains(&0) {
            return Err(TaglexError::InvalidArgument(
                "n-gram size must be positive".to_string(),
            ));
        }
        let mut sizes: Vec<u32> = sizes.to_vec();
        sizes.sort_unstable();
        sizes.dedup();

        let guard = self.registry.begin_build(service_id)?;
        info!(
            "Starting dictionary build for service '{}': {} tags x {} sizes on {} workers",
            guard.service_id(),
            tags.len(),
            sizes.len(),
            self.workers
        );

        let units: Vec<(String, u32)> = tags
            .iter()
            .flat_map(|tag| sizes.iter().map(move |&size| (tag.clone(), size)))
            .collect();
        let total = units.len();
        let completed = Arc::new(AtomicUsize::new(0));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(anyhow::Error::new)?;

        let results: TaglexResult<Vec<((String, u32), TagDictionary, BuildStats)>> =
            pool.install(|| {
                units
                    .par_iter()
                    .map(|(tag, size)| {
                        if self.cancel_token.is_cancelled() {
                            return Err(TaglexError::Cancelled);
                        }
                        let subset = source.fetch(tag, *size)?;
                        let (dict, stats) = self.builder.build_with_stats(&subset)?;

                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        if let Some(ref callback) = self.progress_callback {
                            callback(done, total);
                        }
                        debug!(
                            "Built dictionary for tag '{}' at size {}: {}",
                            tag,
                            size,
                            stats.summary()
                        );
                        Ok(((tag.clone(), *size), dict, stats))
                    })
                    .collect()
            });

        let results = match results {
            Ok(results) => results,
            Err(TaglexError::Cancelled) => {
                info!(
                    "Build for service '{}' cancelled after {} of {} units",
                    guard.service_id(),
                    completed.load(Ordering::SeqCst),
                    total
                );
                // guard drop releases the slot; the previous set keeps serving
                return Err(TaglexError::Cancelled);
            }
            Err(err) => {
                warn!("Build for service '{}' failed: {}", guard.service_id(), err);
                return Err(err);
            }
        };

        let mut stats = BuildStats::default();
        let units_built = results.len();
        let mut per_tag: HashMap<String, HashMap<u32, TagDictionary>> = HashMap::new();
        for ((tag, size), dict, unit_stats) in results {
            stats.merge(&unit_stats);
            per_tag.entry(tag).or_default().insert(size, dict);
        }
        let mut set = ScorerSet::with_capacity(per_tag.len());
        for (tag, dicts) in per_tag {
            set.insert(tag, TagScorer::new(dicts)?);
        }

        let report = BuildReport {
            service_id: guard.service_id().to_string(),
            units_total: total,
            units_built,
            tags: set.len(),
            stats,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        guard.commit(set);
        info!("{}", report.summary());
        Ok(report)
    }
}
