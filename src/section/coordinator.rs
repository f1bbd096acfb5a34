//! Load coordinator driving section loads, retries and refreshes.
//!
//! The coordinator owns the section registry, wraps caller-supplied loaders
//! with the retry executor, and publishes an aggregate snapshot to
//! subscribers after every registry mutation. It is the sole boundary that
//! converts loader failures into state: nothing above it needs to catch
//! errors from `load_section`.
//!
//! # Architecture
//!
//! ```text
//! View                        LoadCoordinator                 Loader
//!  │                               │                            │
//!  │ load_section("financial")     │                            │
//!  ├──────────────────────────────►│ state: loading             │
//!  │                               ├───────────────────────────►│
//!  │                               │        RetryExecutor       │
//!  │                               │◄───────────────────────────┤
//!  │                               │ state: loaded | error      │
//!  │ watch::Receiver               │                            │
//!  │◄── RegistrySnapshot ──────────┤                            │
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{CoordinatorConfig, LoadOptions};
use crate::error::LoadError;
use crate::notify::{Notification, Notifier, NoopNotifier};
use crate::retry::RetryExecutor;

use super::handle::SectionHandle;
use super::record::{Section, SectionUpdate};
use super::state::SectionState;
use super::store::{RegistrySnapshot, SectionStore};

/// Asynchronous loader for one section's data.
///
/// Any rejection is treated uniformly regardless of cause; the coordinator
/// never lets it escape `load_section`.
pub type SectionLoader<T> =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<T, LoadError>> + Send>> + Send + Sync>;

/// Coordinator statistics for monitoring.
#[derive(Debug, Default)]
pub struct CoordinatorStats {
    /// Loads started (after the in-flight guard).
    pub loads_started: AtomicU64,
    /// Loads that stored a payload.
    pub loads_succeeded: AtomicU64,
    /// Loads that exhausted their retries.
    pub loads_failed: AtomicU64,
    /// Individual retry attempts across all loads.
    pub retries_attempted: AtomicU64,
    /// Calls skipped because the section was already loading.
    pub duplicate_loads_skipped: AtomicU64,
}

impl CoordinatorStats {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> CoordinatorStatsSnapshot {
        CoordinatorStatsSnapshot {
            loads_started: self.loads_started.load(Ordering::Relaxed),
            loads_succeeded: self.loads_succeeded.load(Ordering::Relaxed),
            loads_failed: self.loads_failed.load(Ordering::Relaxed),
            retries_attempted: self.retries_attempted.load(Ordering::Relaxed),
            duplicate_loads_skipped: self.duplicate_loads_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of coordinator statistics.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorStatsSnapshot {
    pub loads_started: u64,
    pub loads_succeeded: u64,
    pub loads_failed: u64,
    pub retries_attempted: u64,
    pub duplicate_loads_skipped: u64,
}

/// Outcome of a multi-section refresh.
///
/// A batch never fails hard: each section settles independently and the
/// outcome reports the fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Sections a refresh was attempted for.
    pub attempted: usize,
    /// Sections that stored a payload.
    pub succeeded: usize,
    /// Sections that ended in the error state (or were skipped in flight).
    pub failed: usize,
}

impl BatchOutcome {
    /// True when some but not all sections failed.
    pub fn is_partial_failure(&self) -> bool {
        self.failed > 0 && self.succeeded > 0
    }

    /// True when every attempted section failed.
    pub fn is_total_failure(&self) -> bool {
        self.attempted > 0 && self.succeeded == 0
    }

    /// Success rate as a percentage (100.0 for an empty batch).
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.attempted as f64) * 100.0
    }
}

/// Load coordinator for one view's section registry.
///
/// One instance is created per top-level view, passed by reference to
/// descendants, and discarded with its owning scope. The section map is
/// mutated only through the coordinator's own update functions.
pub struct LoadCoordinator<T> {
    store: SectionStore<T>,
    loaders: RwLock<HashMap<String, SectionLoader<T>>>,
    config: CoordinatorConfig,
    notifier: Arc<dyn Notifier>,
    stats: Arc<CoordinatorStats>,
    snapshot_tx: watch::Sender<RegistrySnapshot>,
}

impl<T: Clone + Send + Sync + 'static> LoadCoordinator<T> {
    /// Creates a new coordinator with the given configuration and a no-op
    /// notification sink.
    pub fn new(config: CoordinatorConfig) -> Self {
        let store = SectionStore::new(config.stale_threshold);
        let (snapshot_tx, _) = watch::channel(RegistrySnapshot::default());
        Self {
            store,
            loaders: RwLock::new(HashMap::new()),
            config,
            notifier: Arc::new(NoopNotifier),
            stats: Arc::new(CoordinatorStats::default()),
            snapshot_tx,
        }
    }

    /// Sets the notification sink for load failures and batch outcomes.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Get a snapshot of load statistics.
    pub fn stats(&self) -> CoordinatorStatsSnapshot {
        self.stats.snapshot()
    }

    /// Subscribes to registry snapshots.
    ///
    /// A new snapshot is published after every registry mutation; the
    /// receiver always holds the latest one.
    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Returns a clone of a section's record.
    pub fn section(&self, id: &str) -> Option<Section<T>> {
        self.store.get(id)
    }

    /// Returns the ids of all registered sections.
    pub fn section_ids(&self) -> Vec<String> {
        self.store.ids()
    }

    /// True if any section is in the error state.
    pub fn has_errors(&self) -> bool {
        self.store.has_errors()
    }

    /// True if any section's data has crossed the staleness threshold.
    pub fn has_stale_data(&self) -> bool {
        self.store.has_stale_data()
    }

    /// True if any load is in flight.
    pub fn is_any_loading(&self) -> bool {
        self.store.is_any_loading()
    }

    /// Mean completion percentage across all sections.
    pub fn overall_progress(&self) -> u8 {
        self.store.overall_progress()
    }

    /// Returns a read/command facade for one named section, registering it
    /// if unseen.
    pub fn handle(self: &Arc<Self>, id: &str) -> SectionHandle<T> {
        if self.store.ensure(id, id) {
            self.publish();
        }
        SectionHandle::new(Arc::clone(self), id)
    }

    /// Loads a section through the retry executor.
    ///
    /// Initializes the section if unseen, transitions it to `Loading`
    /// (clearing the previous error, retaining stale data), and stores the
    /// loader for later refreshes. On success the payload is stored,
    /// `last_updated` is set and staleness cleared; on exhausted retries the
    /// section enters the error state, a notification fires (unless
    /// suppressed by `options`), and `None` is returned. Loader failures
    /// never propagate past this boundary.
    ///
    /// A call for a section that is already loading is skipped and returns
    /// `None` rather than racing the in-flight load.
    pub async fn load_section(
        &self,
        id: &str,
        name: &str,
        loader: SectionLoader<T>,
        options: LoadOptions,
    ) -> Option<T> {
        if self.store.ensure(id, name) {
            self.publish();
        }
        if let Ok(mut loaders) = self.loaders.write() {
            loaders.insert(id.to_string(), Arc::clone(&loader));
        }
        self.run_load(id, loader, options).await
    }

    /// Re-invokes the stored loader for one section.
    ///
    /// Returns `None` if the section has no stored loader.
    pub async fn refresh_section(&self, id: &str) -> Option<T> {
        let loader = self
            .loaders
            .read()
            .ok()
            .and_then(|loaders| loaders.get(id).cloned());
        match loader {
            Some(loader) => self.run_load(id, loader, LoadOptions::default()).await,
            None => {
                debug!(section = id, "No stored loader, skipping refresh");
                None
            }
        }
    }

    /// Re-invokes the stored loader for every section, concurrently.
    ///
    /// Resolves when every attempt has settled; one section's failure never
    /// aborts the others. With no sections registered this resolves
    /// immediately. Partial failure emits an informational notice, total
    /// failure an error notification.
    pub async fn refresh_all(&self) -> BatchOutcome {
        let loaders: Vec<(String, SectionLoader<T>)> = self
            .loaders
            .read()
            .map(|loaders| {
                loaders
                    .iter()
                    .map(|(id, loader)| (id.clone(), Arc::clone(loader)))
                    .collect()
            })
            .unwrap_or_default();

        if loaders.is_empty() {
            return BatchOutcome::default();
        }

        let results = join_all(loaders.iter().map(|(id, loader)| {
            self.run_load(id, Arc::clone(loader), LoadOptions::default())
        }))
        .await;

        let succeeded = results.iter().filter(|r| r.is_some()).count();
        let outcome = BatchOutcome {
            attempted: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        };

        info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Registry refresh settled"
        );

        if outcome.is_total_failure() {
            self.notifier.notify(Notification::error(
                "Dashboard refresh failed",
                format!("All {} sections failed to refresh", outcome.attempted),
            ));
        } else if outcome.is_partial_failure() {
            self.notifier.notify(Notification::warning(
                "Some sections failed to refresh",
                format!(
                    "{} of {} sections failed; previously loaded data is still shown",
                    outcome.failed, outcome.attempted
                ),
            ));
        }

        outcome
    }

    /// Merges partial fields into a section's record and publishes the
    /// updated snapshot.
    ///
    /// If `last_updated` is among the merged fields, staleness is recomputed
    /// immediately against the active threshold. Returns false for an
    /// unknown section.
    pub fn update_section(&self, id: &str, update: SectionUpdate<T>) -> bool {
        let applied = self.store.apply(id, update);
        if applied {
            self.publish();
        }
        applied
    }

    /// Re-derives staleness for every section and publishes if anything
    /// flipped. Returns the number of sections whose flag changed.
    ///
    /// Driven by [`StalenessSweeper`] on a fixed interval.
    ///
    /// [`StalenessSweeper`]: super::sweep::StalenessSweeper
    pub fn sweep_stale(&self) -> usize {
        let flipped = self.store.recompute_staleness();
        if flipped > 0 {
            debug!(flipped, "Staleness sweep updated sections");
            self.publish();
        }
        flipped
    }

    pub(crate) fn store(&self) -> &SectionStore<T> {
        &self.store
    }

    pub(crate) fn publish(&self) {
        self.snapshot_tx.send_replace(self.store.snapshot());
    }

    /// Drives one load to success or final failure, updating section state
    /// on both sides of the await.
    async fn run_load(&self, id: &str, loader: SectionLoader<T>, options: LoadOptions) -> Option<T> {
        if !self.store.try_begin_loading(id) {
            self.stats
                .duplicate_loads_skipped
                .fetch_add(1, Ordering::Relaxed);
            debug!(section = id, "Load already in flight, skipping duplicate");
            return None;
        }
        self.publish();
        self.stats.loads_started.fetch_add(1, Ordering::Relaxed);

        let result = if options.retry_on_error {
            let retry_stats = Arc::clone(&self.stats);
            let retry_section = id.to_string();
            let final_section = id.to_string();
            let executor = RetryExecutor::new(self.config.retry)
                .with_on_retry(Arc::new(move |attempt, err| {
                    retry_stats.retries_attempted.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        section = %retry_section,
                        attempt,
                        error = %err,
                        "Section load failed, retrying"
                    );
                }))
                .with_on_max_retries(Arc::new(move |err| {
                    warn!(
                        section = %final_section,
                        error = %err,
                        "Section load failed after final retry"
                    );
                }));
            executor.execute(|| loader()).await
        } else {
            loader().await
        };

        match result {
            Ok(data) => {
                self.store.apply(
                    id,
                    SectionUpdate::new()
                        .data(data.clone())
                        .state(SectionState::Loaded)
                        .clear_error()
                        .clear_progress()
                        .touch(),
                );
                self.stats.loads_succeeded.fetch_add(1, Ordering::Relaxed);
                debug!(section = id, "Section loaded");
                self.publish();
                Some(data)
            }
            Err(err) => {
                // Previous data and last_updated stay untouched
                self.store.apply(
                    id,
                    SectionUpdate::new()
                        .state(SectionState::Error)
                        .error(err.to_string()),
                );
                self.stats.loads_failed.fetch_add(1, Ordering::Relaxed);
                warn!(section = id, error = %err, "Section entered error state");

                if options.notify_on_error && self.config.notify_on_error {
                    let name = self.store.name(id).unwrap_or_else(|| id.to_string());
                    self.notifier.notify(Notification::error(
                        format!("Failed to load {name}"),
                        err.to_string(),
                    ));
                }
                self.publish();
                None
            }
        }
    }
}
