//! Concurrent scorer registry
//!
//! In-memory map from service id to its committed scorer set. The registry
//! is the only mutable shared state in the crate and upholds two rules:
//! at most one build may be in flight per service (aliases included), and
//! readers always see either the old complete set or the new complete set,
//! never a mix. Builds acquire a [`BuildGuard`] that must be committed or
//! aborted exactly once; dropping an unconsumed guard aborts.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{TaglexError, TaglexResult};
use crate::scorer::ScorerSet;

/// Build lifecycle of one service entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Created but never successfully built.
    Idle,
    /// A build is in flight; the previous set keeps serving.
    Building,
    /// At least one build has committed.
    Ready,
}

#[derive(Debug)]
struct ServiceEntry {
    scorers: Arc<ScorerSet>,
    state: BuildState,
}

impl ServiceEntry {
    fn new() -> Self {
        Self {
            scorers: Arc::new(HashMap::new()),
            state: BuildState::Idle,
        }
    }
}

/// Thread-safe store of built scorer sets, keyed by service id.
#[derive(Clone)]
pub struct ScorerRegistry {
    entries: Arc<DashMap<String, ServiceEntry>>,
    /// alias id -> canonical id; collapsed to one level on insert.
    aliases: Arc<DashMap<String, String>>,
}

impl ScorerRegistry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            aliases: Arc::new(DashMap::new()),
        }
    }

    fn canonical(&self, service_id: &str) -> String {
        self.aliases
            .get(service_id)
            .map(|target| target.value().clone())
            .unwrap_or_else(|| service_id.to_string())
    }

    /// Registers an empty `Idle` entry. No-op for a known service.
    pub fn create(&self, service_id: &str) {
        let canonical = self.canonical(service_id);
        self.entries
            .entry(canonical)
            .or_insert_with(ServiceEntry::new);
    }

    /// Points `alias_id` at `canonical_id`, so both share one entry and one
    /// busy flag. Chains collapse at insertion time.
    pub fn alias(&self, alias_id: &str, canonical_id: &str) {
        let target = self.canonical(canonical_id);
        self.aliases.insert(alias_id.to_string(), target);
    }

    /// Snapshot of the last committed set. `None` for an unknown service;
    /// a known service that never built serves an empty set. Never blocks
    /// on an in-flight build.
    pub fn get(&self, service_id: &str) -> Option<Arc<ScorerSet>> {
        let canonical = self.canonical(service_id);
        self.entries
            .get(&canonical)
            .map(|entry| Arc::clone(&entry.scorers))
    }

    pub fn state(&self, service_id: &str) -> Option<BuildState> {
        let canonical = self.canonical(service_id);
        self.entries.get(&canonical).map(|entry| entry.state)
    }

    /// Known canonical service ids.
    pub fn services(&self) -> Vec<String> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    /// Claims the build slot for a service, creating the entry if missing.
    /// The check-and-set is atomic; a second claim fails with `Busy` until
    /// the returned guard is committed, aborted, or dropped.
    pub fn begin_build(&self, service_id: &str) -> TaglexResult<BuildGuard<'_>> {
        let canonical = self.canonical(service_id);
        let mut entry = self
            .entries
            .entry(canonical.clone())
            .or_insert_with(ServiceEntry::new);
        if entry.state == BuildState::Building {
            return Err(TaglexError::Busy { service: canonical });
        }
        let prior = entry.state;
        entry.state = BuildState::Building;
        drop(entry);
        debug!("Build slot claimed for service '{}'", canonical);
        Ok(BuildGuard {
            registry: self,
            service_id: canonical,
            prior,
            consumed: false,
        })
    }

    /// Deletes a service and any aliases pointing at it. Rejected while a
    /// build is in flight.
    pub fn remove(&self, service_id: &str) -> TaglexResult<()> {
        let canonical = self.canonical(service_id);
        match self.entries.entry(canonical.clone()) {
            Entry::Occupied(occupied) => {
                if occupied.get().state == BuildState::Building {
                    return Err(TaglexError::Busy { service: canonical });
                }
                occupied.remove();
            }
            Entry::Vacant(_) => {}
        }
        self.aliases.retain(|_, target| *target != canonical);
        Ok(())
    }

    fn finish(&self, service_id: &str, scorers: Option<ScorerSet>, prior: BuildState) {
        if let Some(mut entry) = self.entries.get_mut(service_id) {
            match scorers {
                Some(set) => {
                    info!(
                        "Committing {} scorers for service '{}'",
                        set.len(),
                        service_id
                    );
                    entry.scorers = Arc::new(set);
                    entry.state = BuildState::Ready;
                }
                None => {
                    debug!("Releasing build slot for service '{}'", service_id);
                    entry.state = prior;
                }
            }
        }
    }
}

impl Default for ScorerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive claim on a service's build slot.
///
/// Consumed by `commit` or `abort`; dropping it unconsumed aborts, so an
/// early return from a failed build can never leave the slot stuck busy.
#[must_use]
pub struct BuildGuard<'a> {
    registry: &'a ScorerRegistry,
    service_id: String,
    prior: BuildState,
    consumed: bool,
}

impl BuildGuard<'_> {
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Swaps in the new set wholesale and marks the service `Ready`.
    pub fn commit(mut self, scorers: ScorerSet) {
        self.consumed = true;
        self.registry.finish(&self.service_id, Some(scorers), self.prior);
    }

    /// Releases the slot, leaving the previously committed set untouched.
    pub fn abort(mut self) {
        self.consumed = true;
        self.registry.finish(&self.service_id, None, self.prior);
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if !self.consumed {
            self.registry.finish(&self.service_id, None, self.prior);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::TagScorer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    fn one_tag_set(tag: &str, word: &str, weight: f64) -> ScorerSet {
        let mut dict = HashMap::new();
        dict.insert(word.to_string(), weight);
        let mut dicts = HashMap::new();
        dicts.insert(1u32, dict);
        let mut set = HashMap::new();
        set.insert(tag.to_string(), TagScorer::new(dicts).unwrap());
        set
    }

    #[test]
    fn test_begin_build_is_exclusive() {
        let registry = ScorerRegistry::new();
        let guard = registry.begin_build("articles").unwrap();
        let second = registry.begin_build("articles");
        assert!(matches!(second, Err(TaglexError::Busy { .. })));
        guard.abort();
        assert!(registry.begin_build("articles").is_ok());
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let registry = ScorerRegistry::new();
        let barrier = Barrier::new(4);
        let wins = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    barrier.wait();
                    let claim = registry.begin_build("articles");
                    if claim.is_ok() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    // hold the slot until every thread has tried
                    barrier.wait();
                    if let Ok(guard) = claim {
                        guard.abort();
                    }
                });
            }
        });
        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_commit_swaps_wholesale() {
        let registry = ScorerRegistry::new();
        registry.create("articles");
        let before = registry.get("articles").unwrap();
        assert!(before.is_empty());

        let guard = registry.begin_build("articles").unwrap();
        guard.commit(one_tag_set("sports", "goal", 2.0));

        // the pre-commit snapshot is unchanged; fresh reads see the new set
        assert!(before.is_empty());
        let after = registry.get("articles").unwrap();
        assert!(after.contains_key("sports"));
        assert_eq!(registry.state("articles"), Some(BuildState::Ready));
    }

    #[test]
    fn test_abort_preserves_previous_set() {
        let registry = ScorerRegistry::new();
        let guard = registry.begin_build("articles").unwrap();
        guard.commit(one_tag_set("sports", "goal", 2.0));

        let guard = registry.begin_build("articles").unwrap();
        guard.abort();

        let set = registry.get("articles").unwrap();
        assert!(set.contains_key("sports"));
        assert_eq!(registry.state("articles"), Some(BuildState::Ready));
    }

    #[test]
    fn test_dropped_guard_aborts() {
        let registry = ScorerRegistry::new();
        {
            let _guard = registry.begin_build("articles").unwrap();
            assert_eq!(registry.state("articles"), Some(BuildState::Building));
        }
        assert_eq!(registry.state("articles"), Some(BuildState::Idle));
        assert!(registry.begin_build("articles").is_ok());
    }

    #[test]
    fn test_alias_shares_busy_flag() {
        let registry = ScorerRegistry::new();
        registry.create("articles");
        registry.alias("articles-v2", "articles");

        let guard = registry.begin_build("articles").unwrap();
        let via_alias = registry.begin_build("articles-v2");
        assert!(matches!(via_alias, Err(TaglexError::Busy { .. })));

        guard.commit(one_tag_set("sports", "goal", 2.0));
        let set = registry.get("articles-v2").unwrap();
        assert!(set.contains_key("sports"));
    }

    #[test]
    fn test_remove_while_building_rejected() {
        let registry = ScorerRegistry::new();
        let guard = registry.begin_build("articles").unwrap();
        assert!(matches!(
            registry.remove("articles"),
            Err(TaglexError::Busy { .. })
        ));
        guard.commit(one_tag_set("sports", "goal", 2.0));
        assert!(registry.remove("articles").is_ok());
        assert!(registry.get("articles").is_none());
    }

    #[test]
    fn test_remove_drops_aliases() {
        let registry = ScorerRegistry::new();
        registry.create("articles");
        registry.alias("articles-v2", "articles");
        registry.remove("articles").unwrap();
        // the alias no longer redirects; this claim creates a fresh entry
        let guard = registry.begin_build("articles-v2").unwrap();
        assert_eq!(guard.service_id(), "articles-v2");
        guard.abort();
    }

    #[test]
    fn test_unknown_service_reads_none() {
        let registry = ScorerRegistry::new();
        assert!(registry.get("nope").is_none());
        assert!(registry.state("nope").is_none());
    }

    #[test]
    fn test_services_lists_canonical_ids() {
        let registry = ScorerRegistry::new();
        registry.create("a");
        registry.create("b");
        let mut ids = registry.services();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
