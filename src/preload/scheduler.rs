//! Preload scheduler for deferred UI panels.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::PreloadConfig;
use crate::error::PreloadError;

use super::entry::{PreloadEntry, PreloadRecord, PreloadState};

/// Asynchronous loader for one deferred UI panel's module.
pub type PanelLoader =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<(), PreloadError>> + Send>> + Send + Sync>;

/// Preload statistics for monitoring.
#[derive(Debug, Default)]
pub struct PreloadStats {
    /// Loads actually started.
    pub loads_triggered: AtomicU64,
    /// Loads that completed successfully.
    pub loads_succeeded: AtomicU64,
    /// Loads that failed (silently).
    pub loads_failed: AtomicU64,
    /// Hover timers reset by a repeated hover before firing.
    pub debounce_resets: AtomicU64,
    /// Hover timers cleared by an explicit cancel.
    pub timers_cancelled: AtomicU64,
}

impl PreloadStats {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> PreloadStatsSnapshot {
        PreloadStatsSnapshot {
            loads_triggered: self.loads_triggered.load(Ordering::Relaxed),
            loads_succeeded: self.loads_succeeded.load(Ordering::Relaxed),
            loads_failed: self.loads_failed.load(Ordering::Relaxed),
            debounce_resets: self.debounce_resets.load(Ordering::Relaxed),
            timers_cancelled: self.timers_cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of preload statistics.
#[derive(Debug, Clone, Default)]
pub struct PreloadStatsSnapshot {
    pub loads_triggered: u64,
    pub loads_succeeded: u64,
    pub loads_failed: u64,
    pub debounce_resets: u64,
    pub timers_cancelled: u64,
}

struct RegisteredPanel {
    entry: PreloadEntry,
    loader: PanelLoader,
}

/// Scheduler for eager and hover-intent preloading of deferred UI panels.
///
/// The scheduler:
/// 1. Eagerly loads the highest-priority panels via
///    [`preload_high_priority`](Self::preload_high_priority)
/// 2. Arms a debounced load on hover intent, resetting the timer on repeat
///    hovers for the same panel
/// 3. Cancels pending timers on request, and all of them on teardown
///
/// Preloading is a best-effort optimization: failures are recorded and
/// logged but never surface to the user. The panel's on-demand load path
/// remains the authoritative attempt.
pub struct PreloadScheduler {
    /// Registered panels, in registration order.
    panels: RwLock<Vec<RegisteredPanel>>,
    /// Most recent preload attempt per panel.
    records: DashMap<String, PreloadRecord>,
    /// Armed hover timers: panel id -> (generation, cancellation token).
    hover_timers: DashMap<String, (u64, CancellationToken)>,
    /// Generation counter so a firing timer only clears its own map entry.
    timer_generation: AtomicU64,
    /// Statistics for monitoring.
    stats: PreloadStats,
    /// Scheduler configuration.
    config: PreloadConfig,
    /// Root token; every hover timer is a child of this.
    shutdown: CancellationToken,
}

impl PreloadScheduler {
    /// Creates a new scheduler.
    pub fn new(config: PreloadConfig) -> Arc<Self> {
        Arc::new(Self {
            panels: RwLock::new(Vec::new()),
            records: DashMap::new(),
            hover_timers: DashMap::new(),
            timer_generation: AtomicU64::new(0),
            stats: PreloadStats::default(),
            config,
            shutdown: CancellationToken::new(),
        })
    }

    /// Registers a panel, replacing any previous registration for the id.
    pub fn register(&self, entry: PreloadEntry, loader: PanelLoader) {
        let Ok(mut panels) = self.panels.write() else {
            return;
        };
        match panels.iter_mut().find(|p| p.entry.id == entry.id) {
            Some(existing) => *existing = RegisteredPanel { entry, loader },
            None => panels.push(RegisteredPanel { entry, loader }),
        }
    }

    /// Returns the number of registered panels.
    pub fn panel_count(&self) -> usize {
        self.panels.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Returns the number of armed hover timers.
    pub fn pending_timer_count(&self) -> usize {
        self.hover_timers.len()
    }

    /// Returns the most recent preload record for a panel.
    pub fn record(&self, id: &str) -> Option<PreloadRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// True once a panel's preload has completed successfully.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.records
            .get(id)
            .map(|r| r.state == PreloadState::Loaded)
            .unwrap_or(false)
    }

    /// Get a snapshot of preload statistics.
    pub fn stats(&self) -> PreloadStatsSnapshot {
        self.stats.snapshot()
    }

    /// Eagerly preloads the highest-priority panels.
    ///
    /// Panels are sorted ascending by priority (ties keep registration
    /// order) and the top slice is triggered. Panels already loaded or in
    /// flight are skipped. Returns how many loads were started.
    pub fn preload_high_priority(self: &Arc<Self>) -> usize {
        let mut entries: Vec<PreloadEntry> = self
            .panels
            .read()
            .map(|panels| panels.iter().map(|p| p.entry.clone()).collect())
            .unwrap_or_default();
        entries.sort_by_key(|e| e.priority);

        let mut triggered = 0;
        for entry in entries.into_iter().take(self.config.eager_count) {
            if self.trigger_load(&entry.id) {
                triggered += 1;
            }
        }

        info!(
            triggered,
            eager_count = self.config.eager_count,
            "Eager preload pass complete"
        );
        triggered
    }

    /// Arms a debounced preload for a panel on hover intent.
    ///
    /// The load fires after the configured debounce window. A second call
    /// for the same id before the timer fires resets the timer rather than
    /// stacking a duplicate load.
    pub fn preload_on_hover(self: &Arc<Self>, id: &str) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let generation = self.timer_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = self.shutdown.child_token();

        if let Some((_, previous)) = self
            .hover_timers
            .insert(id.to_string(), (generation, token.clone()))
        {
            previous.cancel();
            self.stats.debounce_resets.fetch_add(1, Ordering::Relaxed);
            trace!(panel = id, "Hover debounce timer reset");
        }

        let scheduler = Arc::clone(self);
        let id = id.to_string();
        let debounce = self.config.hover_debounce;
        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = token.cancelled() => {}

                _ = tokio::time::sleep(debounce) => {
                    // Only clear the map entry if a later hover hasn't
                    // replaced this timer
                    scheduler
                        .hover_timers
                        .remove_if(&id, |_, (armed, _)| *armed == generation);
                    scheduler.trigger_load(&id);
                }
            }
        });
    }

    /// Clears a pending hover timer for a panel.
    ///
    /// An already-in-flight load is not affected; only the unfired timer is
    /// cleared. Returns true if a timer was pending.
    pub fn cancel_preload(&self, id: &str) -> bool {
        if let Some((_, (_, token))) = self.hover_timers.remove(id) {
            token.cancel();
            self.stats.timers_cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(panel = id, "Pending preload cancelled");
            true
        } else {
            false
        }
    }

    /// Tears the scheduler down, clearing every pending hover timer.
    ///
    /// In-flight loads run to completion (their outcomes are still
    /// recorded), but no further timers fire and no new hovers arm.
    pub fn teardown(&self) {
        self.shutdown.cancel();
        self.hover_timers.clear();
        debug!("Preload scheduler torn down, pending timers cleared");
    }

    /// Starts the actual load for a panel.
    ///
    /// Skips unregistered panels, panels already loaded and panels with a
    /// load in flight; a panel whose last attempt failed may be retried.
    /// Returns true if a load was started.
    fn trigger_load(self: &Arc<Self>, id: &str) -> bool {
        let loader = self.panels.read().ok().and_then(|panels| {
            panels
                .iter()
                .find(|p| p.entry.id == id)
                .map(|p| Arc::clone(&p.loader))
        });
        let Some(loader) = loader else {
            debug!(panel = id, "Preload requested for unregistered panel");
            return false;
        };

        match self.records.entry(id.to_string()) {
            Entry::Occupied(mut occupied) => match occupied.get().state {
                PreloadState::Loaded => {
                    trace!(panel = id, "Panel already preloaded, skipping");
                    return false;
                }
                PreloadState::Pending => {
                    trace!(panel = id, "Panel preload already in flight, skipping");
                    return false;
                }
                PreloadState::Error => {
                    occupied.insert(PreloadRecord::pending());
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(PreloadRecord::pending());
            }
        }

        self.stats.loads_triggered.fetch_add(1, Ordering::Relaxed);
        debug!(panel = id, "Panel preload started");

        let scheduler = Arc::clone(self);
        let id = id.to_string();
        tokio::spawn(async move {
            match loader().await {
                Ok(()) => {
                    let mut duration_ms = 0;
                    if let Some(mut record) = scheduler.records.get_mut(&id) {
                        record.settle_loaded();
                        duration_ms = record.duration.unwrap_or_default().as_millis() as u64;
                    }
                    scheduler.stats.loads_succeeded.fetch_add(1, Ordering::Relaxed);
                    debug!(panel = %id, duration_ms, "Panel preloaded");
                }
                Err(err) => {
                    if let Some(mut record) = scheduler.records.get_mut(&id) {
                        record.settle_error(err.to_string());
                    }
                    scheduler.stats.loads_failed.fetch_add(1, Ordering::Relaxed);
                    // Best-effort: never surfaces to the user, the panel's
                    // on-demand load path handles its own errors
                    debug!(panel = %id, error = %err, "Panel preload failed");
                }
            }
        });
        true
    }
}

impl Drop for PreloadScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
