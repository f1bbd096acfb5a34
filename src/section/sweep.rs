//! Background staleness sweep daemon.
//!
//! Staleness is time-relative: a section loaded once and never touched again
//! must still surface as stale, so the sweep re-derives every section's flag
//! on a fixed interval independent of load activity. The owning view spawns
//! the sweeper next to its coordinator and cancels the token on teardown.
//!
//! # Example
//!
//! ```ignore
//! use dashload::section::StalenessSweeper;
//!
//! let sweeper = StalenessSweeper::new(Arc::clone(&coordinator));
//! tokio::spawn(sweeper.run(shutdown_token));
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::coordinator::LoadCoordinator;

/// Daemon that periodically re-derives section staleness.
pub struct StalenessSweeper<T> {
    coordinator: Arc<LoadCoordinator<T>>,
    interval: Duration,
}

impl<T: Clone + Send + Sync + 'static> StalenessSweeper<T> {
    /// Creates a sweeper using the coordinator's configured sweep interval.
    pub fn new(coordinator: Arc<LoadCoordinator<T>>) -> Self {
        let interval = coordinator.config().sweep_interval;
        Self {
            coordinator,
            interval,
        }
    }

    /// Sets a custom sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs the sweep loop until shutdown is signalled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            stale_threshold_secs = self.coordinator.config().stale_threshold.as_secs(),
            "Staleness sweeper starting"
        );

        let mut interval = tokio::time::interval(self.interval);
        // Skip the first immediate tick
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Staleness sweeper shutting down");
                    break;
                }

                _ = interval.tick() => {
                    let flipped = self.coordinator.sweep_stale();
                    if flipped > 0 {
                        debug!(flipped, "Sweep marked sections stale");
                    }
                }
            }
        }
    }
}
