//! Configuration for the load coordinator and preload scheduler.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default freshness threshold after which loaded data is considered stale.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// Default interval between staleness sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default number of panels loaded eagerly by priority.
pub const DEFAULT_EAGER_COUNT: usize = 2;

/// Default debounce window for hover-intent preloads.
pub const DEFAULT_HOVER_DEBOUNCE: Duration = Duration::from_millis(200);

/// Load coordinator configuration.
///
/// One config is instantiated per coordinator and reused across every load
/// issued through it.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Age after which a section's data is considered stale.
    pub stale_threshold: Duration,
    /// Interval between background staleness sweeps.
    pub sweep_interval: Duration,
    /// Retry policy applied to failing loaders.
    pub retry: RetryPolicy,
    /// Whether load failures emit a user-facing notification by default.
    /// Per-call [`LoadOptions`] can still suppress individual notifications.
    pub notify_on_error: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            stale_threshold: DEFAULT_STALE_THRESHOLD,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            retry: RetryPolicy::default(),
            notify_on_error: true,
        }
    }
}

impl CoordinatorConfig {
    /// Sets a custom staleness threshold.
    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold = threshold;
        self
    }

    /// Sets a custom sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets a custom retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enables or disables error notifications globally.
    pub fn with_notify_on_error(mut self, notify: bool) -> Self {
        self.notify_on_error = notify;
        self
    }
}

/// Per-call options for [`LoadCoordinator::load_section`].
///
/// [`LoadCoordinator::load_section`]: crate::section::LoadCoordinator::load_section
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Run the loader through the retry executor. When false the loader gets
    /// exactly one attempt.
    pub retry_on_error: bool,
    /// Emit a notification when the load ultimately fails.
    pub notify_on_error: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            retry_on_error: true,
            notify_on_error: true,
        }
    }
}

impl LoadOptions {
    /// Sets whether the loader is retried on failure.
    pub fn with_retry_on_error(mut self, retry: bool) -> Self {
        self.retry_on_error = retry;
        self
    }

    /// Sets whether a failed load emits a notification.
    pub fn with_notify_on_error(mut self, notify: bool) -> Self {
        self.notify_on_error = notify;
        self
    }
}

/// Preload scheduler configuration.
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// How many of the highest-priority panels are loaded eagerly.
    pub eager_count: usize,
    /// Debounce window between a hover signal and the triggered load.
    pub hover_debounce: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            eager_count: DEFAULT_EAGER_COUNT,
            hover_debounce: DEFAULT_HOVER_DEBOUNCE,
        }
    }
}

impl PreloadConfig {
    /// Sets how many panels are preloaded eagerly.
    pub fn with_eager_count(mut self, count: usize) -> Self {
        self.eager_count = count;
        self
    }

    /// Sets a custom hover debounce window.
    pub fn with_hover_debounce(mut self, debounce: Duration) -> Self {
        self.hover_debounce = debounce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_config_defaults() {
        let config = CoordinatorConfig::default();

        assert_eq!(config.stale_threshold, Duration::from_secs(600));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert!(config.notify_on_error);
    }

    #[test]
    fn coordinator_config_builders() {
        let config = CoordinatorConfig::default()
            .with_stale_threshold(Duration::from_secs(30))
            .with_sweep_interval(Duration::from_secs(5))
            .with_notify_on_error(false);

        assert_eq!(config.stale_threshold, Duration::from_secs(30));
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
        assert!(!config.notify_on_error);
    }

    #[test]
    fn load_options_defaults() {
        let options = LoadOptions::default();

        assert!(options.retry_on_error);
        assert!(options.notify_on_error);
    }

    #[test]
    fn load_options_builders() {
        let options = LoadOptions::default()
            .with_retry_on_error(false)
            .with_notify_on_error(false);

        assert!(!options.retry_on_error);
        assert!(!options.notify_on_error);
    }

    #[test]
    fn preload_config_defaults() {
        let config = PreloadConfig::default();

        assert_eq!(config.eager_count, 2);
        assert_eq!(config.hover_debounce, Duration::from_millis(200));
    }
}
