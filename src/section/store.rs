//! Section registry backed by an RwLock map.
//!
//! The store is the only place section records are mutated; consumers go
//! through the coordinator's update functions, never touch records directly.
//! Derived flags (`has_errors`, `has_stale_data`, `is_any_loading`) are
//! computed on read by iterating the registry, not cached.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::record::{Section, SectionUpdate};
use super::state::SectionState;

/// Payload-free view of one section, for snapshots and change notifications.
#[derive(Debug, Clone)]
pub struct SectionSnapshot {
    pub id: String,
    pub name: String,
    pub state: SectionState,
    pub error: Option<String>,
    pub last_updated: Option<Instant>,
    pub is_stale: bool,
    pub progress: Option<u8>,
    /// Whether a payload is present (the payload itself is not carried).
    pub has_data: bool,
}

/// Aggregate view of the whole registry, published to subscribers after
/// every mutation.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// Per-section views, in no particular order.
    pub sections: Vec<SectionSnapshot>,
    /// True if any section is in the error state.
    pub has_errors: bool,
    /// True if any section's data has crossed the staleness threshold.
    pub has_stale_data: bool,
    /// True if any load is in flight.
    pub is_any_loading: bool,
    /// Mean completion percentage across all sections.
    pub overall_progress: u8,
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            has_errors: false,
            has_stale_data: false,
            is_any_loading: false,
            // An empty registry has nothing outstanding
            overall_progress: 100,
        }
    }
}

/// Registry mapping section ids to their records.
///
/// Owned by one coordinator for the lifetime of the consuming view; created
/// with it, discarded with it. No persistence beyond that lifetime.
#[derive(Debug)]
pub struct SectionStore<T> {
    sections: RwLock<HashMap<String, Section<T>>>,
    stale_threshold: Duration,
}

impl<T: Clone> SectionStore<T> {
    /// Creates an empty store with the given staleness threshold.
    pub fn new(stale_threshold: Duration) -> Self {
        Self {
            sections: RwLock::new(HashMap::new()),
            stale_threshold,
        }
    }

    /// Returns the active staleness threshold.
    pub fn stale_threshold(&self) -> Duration {
        self.stale_threshold
    }

    /// Registers the section if unseen. Returns true if it was created.
    pub fn ensure(&self, id: &str, name: &str) -> bool {
        if let Ok(mut sections) = self.sections.write() {
            if sections.contains_key(id) {
                return false;
            }
            sections.insert(id.to_string(), Section::new(id, name));
            true
        } else {
            false
        }
    }

    /// Returns a clone of the section record.
    pub fn get(&self, id: &str) -> Option<Section<T>> {
        self.sections
            .read()
            .ok()
            .and_then(|sections| sections.get(id).cloned())
    }

    /// Returns the section's display name.
    pub fn name(&self, id: &str) -> Option<String> {
        self.sections
            .read()
            .ok()
            .and_then(|sections| sections.get(id).map(|s| s.name.clone()))
    }

    /// Returns the section's current state.
    pub fn state(&self, id: &str) -> Option<SectionState> {
        self.sections
            .read()
            .ok()
            .and_then(|sections| sections.get(id).map(|s| s.state))
    }

    /// Returns the section's payload, if loaded.
    pub fn data(&self, id: &str) -> Option<T> {
        self.sections
            .read()
            .ok()
            .and_then(|sections| sections.get(id).and_then(|s| s.data.clone()))
    }

    /// Returns all registered section ids.
    pub fn ids(&self) -> Vec<String> {
        self.sections
            .read()
            .map(|sections| sections.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of registered sections.
    pub fn len(&self) -> usize {
        self.sections.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns true if no sections are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merges a partial update into a section record.
    ///
    /// This is the single mutation path. The stored `is_stale` flag is
    /// re-derived on every merge, so an update carrying `last_updated` is
    /// immediately reconciled against the current threshold.
    ///
    /// Returns false if the section is unknown or the lock is poisoned.
    pub fn apply(&self, id: &str, update: SectionUpdate<T>) -> bool {
        let Ok(mut sections) = self.sections.write() else {
            return false;
        };
        let Some(section) = sections.get_mut(id) else {
            return false;
        };

        if let Some(data) = update.data {
            section.data = Some(data);
        }
        if let Some(state) = update.state {
            section.state = state;
        }
        if let Some(error) = update.error {
            section.error = error;
        }
        if let Some(at) = update.last_updated {
            section.last_updated = Some(at);
        }
        if let Some(progress) = update.progress {
            section.progress = progress;
        }

        section.is_stale = section.compute_stale(self.stale_threshold);
        true
    }

    /// Transitions a section into `Loading` if the state machine allows it.
    ///
    /// Clears the previous error and progress while retaining data and
    /// `last_updated` (stale-while-revalidate). The check and the transition
    /// happen under one write lock, so two racing loads for the same id
    /// cannot both pass the guard.
    ///
    /// Returns false if the section is unknown or already loading.
    pub fn try_begin_loading(&self, id: &str) -> bool {
        let Ok(mut sections) = self.sections.write() else {
            return false;
        };
        let Some(section) = sections.get_mut(id) else {
            return false;
        };
        if !section.state.can_start_loading() {
            return false;
        }
        section.state = SectionState::Loading;
        section.error = None;
        section.progress = None;
        section.is_stale = section.compute_stale(self.stale_threshold);
        true
    }

    /// True if any section is in the error state.
    pub fn has_errors(&self) -> bool {
        self.sections
            .read()
            .map(|sections| {
                sections
                    .values()
                    .any(|s| s.state == SectionState::Error)
            })
            .unwrap_or(false)
    }

    /// True if any section's data has crossed the staleness threshold.
    ///
    /// Derived live from `last_updated`, so staleness surfaces on read even
    /// between sweep ticks.
    pub fn has_stale_data(&self) -> bool {
        self.sections
            .read()
            .map(|sections| {
                sections
                    .values()
                    .any(|s| s.compute_stale(self.stale_threshold))
            })
            .unwrap_or(false)
    }

    /// True if any load is in flight.
    pub fn is_any_loading(&self) -> bool {
        self.sections
            .read()
            .map(|sections| sections.values().any(|s| s.state.is_loading()))
            .unwrap_or(false)
    }

    /// Mean completion percentage across all sections.
    ///
    /// An empty registry reports 100: there is nothing outstanding.
    pub fn overall_progress(&self) -> u8 {
        let Ok(sections) = self.sections.read() else {
            return 0;
        };
        if sections.is_empty() {
            return 100;
        }
        let total: u32 = sections
            .values()
            .map(|s| s.completion_percent() as u32)
            .sum();
        (total / sections.len() as u32) as u8
    }

    /// Re-derives the stored `is_stale` flag for every section with a
    /// `last_updated` timestamp. Returns how many sections flipped.
    ///
    /// Called by the sweep daemon; staleness is time-relative and must
    /// surface even when no loads occur.
    pub fn recompute_staleness(&self) -> usize {
        let Ok(mut sections) = self.sections.write() else {
            return 0;
        };
        let mut flipped = 0;
        for section in sections.values_mut() {
            if section.last_updated.is_none() {
                continue;
            }
            let stale = section.compute_stale(self.stale_threshold);
            if stale != section.is_stale {
                section.is_stale = stale;
                flipped += 1;
            }
        }
        flipped
    }

    /// Builds an aggregate snapshot of the registry.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let Ok(sections) = self.sections.read() else {
            return RegistrySnapshot::default();
        };
        if sections.is_empty() {
            return RegistrySnapshot::default();
        }

        let mut views = Vec::with_capacity(sections.len());
        let mut has_errors = false;
        let mut has_stale_data = false;
        let mut is_any_loading = false;
        let mut total_percent: u32 = 0;

        for section in sections.values() {
            let stale = section.compute_stale(self.stale_threshold);
            has_errors |= section.state == SectionState::Error;
            has_stale_data |= stale;
            is_any_loading |= section.state.is_loading();
            total_percent += section.completion_percent() as u32;

            views.push(SectionSnapshot {
                id: section.id.clone(),
                name: section.name.clone(),
                state: section.state,
                error: section.error.clone(),
                last_updated: section.last_updated,
                is_stale: stale,
                progress: section.progress,
                has_data: section.data.is_some(),
            });
        }

        RegistrySnapshot {
            overall_progress: (total_percent / views.len() as u32) as u8,
            sections: views,
            has_errors,
            has_stale_data,
            is_any_loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SectionStore<String> {
        SectionStore::new(Duration::from_secs(600))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_ensure_creates_once() {
        let store = store();

        assert!(store.ensure("financial", "Financial Metrics"));
        assert!(!store.ensure("financial", "Renamed"));

        let section = store.get("financial").unwrap();
        assert_eq!(section.name, "Financial Metrics");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_store() {
        let store = store();

        assert!(store.is_empty());
        assert!(!store.has_errors());
        assert!(!store.has_stale_data());
        assert!(!store.is_any_loading());
        assert_eq!(store.overall_progress(), 100);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Updates
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_apply_merges_fields() {
        let store = store();
        store.ensure("clients", "Client List");

        let applied = store.apply(
            "clients",
            SectionUpdate::new()
                .data("42 clients".to_string())
                .state(SectionState::Loaded)
                .clear_error()
                .touch(),
        );
        assert!(applied);

        let section = store.get("clients").unwrap();
        assert_eq!(section.data.as_deref(), Some("42 clients"));
        assert_eq!(section.state, SectionState::Loaded);
        assert!(section.error.is_none());
        assert!(section.last_updated.is_some());
        assert!(!section.is_stale);
    }

    #[test]
    fn test_apply_unknown_section() {
        let store = store();
        assert!(!store.apply("ghost", SectionUpdate::new().state(SectionState::Loading)));
    }

    #[test]
    fn test_apply_preserves_untouched_fields() {
        let store = store();
        store.ensure("health", "System Health");
        store.apply(
            "health",
            SectionUpdate::new()
                .data("ok".to_string())
                .state(SectionState::Loaded)
                .touch(),
        );
        let before = store.get("health").unwrap();

        // Error transition leaves data and timestamp alone
        store.apply(
            "health",
            SectionUpdate::new()
                .state(SectionState::Error)
                .error("network error: timeout"),
        );

        let after = store.get("health").unwrap();
        assert_eq!(after.data, before.data);
        assert_eq!(after.last_updated, before.last_updated);
        assert_eq!(after.state, SectionState::Error);
        assert_eq!(after.error.as_deref(), Some("network error: timeout"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derived flags
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_derived_flags() {
        let store = store();
        store.ensure("a", "A");
        store.ensure("b", "B");

        store.apply("a", SectionUpdate::new().state(SectionState::Loading));
        assert!(store.is_any_loading());
        assert!(!store.has_errors());

        store.apply(
            "a",
            SectionUpdate::new().state(SectionState::Error).error("boom"),
        );
        store.apply(
            "b",
            SectionUpdate::new().state(SectionState::Loaded).touch(),
        );
        assert!(store.has_errors());
        assert!(!store.is_any_loading());
    }

    #[test]
    fn test_stale_data_surfaces_without_sweep() {
        let store = SectionStore::<String>::new(Duration::from_millis(0));
        store.ensure("a", "A");
        store.apply(
            "a",
            SectionUpdate::new().state(SectionState::Loaded).touch(),
        );

        // Zero threshold: stale immediately, no sweep required for the getter
        assert!(store.has_stale_data());
    }

    #[test]
    fn test_recompute_staleness_flips_flag() {
        let store = SectionStore::<String>::new(Duration::from_millis(0));
        store.ensure("a", "A");
        store.apply(
            "a",
            SectionUpdate::new()
                .state(SectionState::Loaded)
                .last_updated(Instant::now() - Duration::from_secs(1)),
        );

        // The merge already re-derived the flag, so the sweep sees no change
        assert_eq!(store.recompute_staleness(), 0);
        assert!(store.get("a").unwrap().is_stale);
    }

    #[test]
    fn test_recompute_skips_never_loaded() {
        let store = SectionStore::<String>::new(Duration::ZERO);
        store.ensure("a", "A");

        assert_eq!(store.recompute_staleness(), 0);
        assert!(!store.get("a").unwrap().is_stale);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Progress aggregation and snapshots
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_overall_progress_mean() {
        let store = store();
        store.ensure("a", "A");
        store.ensure("b", "B");

        store.apply(
            "a",
            SectionUpdate::new().state(SectionState::Loaded).touch(),
        );
        store.apply(
            "b",
            SectionUpdate::new().state(SectionState::Loading).progress(50),
        );

        // (100 + 50) / 2
        assert_eq!(store.overall_progress(), 75);
    }

    #[test]
    fn test_snapshot_reflects_registry() {
        let store = store();
        store.ensure("a", "A");
        store.ensure("b", "B");
        store.apply(
            "a",
            SectionUpdate::new()
                .data("payload".to_string())
                .state(SectionState::Loaded)
                .touch(),
        );
        store.apply(
            "b",
            SectionUpdate::new().state(SectionState::Error).error("x"),
        );

        let snapshot = store.snapshot();
        assert_eq!(snapshot.sections.len(), 2);
        assert!(snapshot.has_errors);
        assert!(!snapshot.is_any_loading);
        assert_eq!(snapshot.overall_progress, 50);

        let a = snapshot.sections.iter().find(|s| s.id == "a").unwrap();
        assert!(a.has_data);
        assert_eq!(a.state, SectionState::Loaded);
    }

    #[test]
    fn test_empty_snapshot_is_complete() {
        let snapshot = store().snapshot();
        assert!(snapshot.sections.is_empty());
        assert_eq!(snapshot.overall_progress, 100);
    }
}
