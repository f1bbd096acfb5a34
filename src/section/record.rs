//! Section records and partial updates.

use std::time::{Duration, Instant};

use super::state::SectionState;

/// One independently loaded unit of dashboard data.
///
/// A loading section retains its previous `data` and `last_updated` until a
/// new load succeeds (stale-while-revalidate); a failed load must never erase
/// previously loaded data.
#[derive(Debug, Clone)]
pub struct Section<T> {
    /// Unique key within a registry instance.
    pub id: String,
    /// Human-readable label, display-only.
    pub name: String,
    /// Last successfully loaded payload.
    pub data: Option<T>,
    /// Current load state.
    pub state: SectionState,
    /// Last error message, cleared when a load succeeds.
    pub error: Option<String>,
    /// Timestamp of the last successful load.
    pub last_updated: Option<Instant>,
    /// Derived freshness flag, refreshed on mutation and by the sweep timer.
    pub is_stale: bool,
    /// Optional 0-100 progress for loads that report incrementally.
    pub progress: Option<u8>,
}

impl<T> Section<T> {
    /// Creates a new idle section with no data.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data: None,
            state: SectionState::Idle,
            error: None,
            last_updated: None,
            is_stale: false,
            progress: None,
        }
    }

    /// Returns the time since the last successful load.
    pub fn age(&self) -> Option<Duration> {
        self.last_updated.map(|at| at.elapsed())
    }

    /// Derives the staleness flag from `last_updated` and the threshold.
    ///
    /// A section that has never loaded is not stale. Data is stale at or
    /// after the threshold elapses, never before.
    pub fn compute_stale(&self, threshold: Duration) -> bool {
        match self.last_updated {
            Some(at) => at.elapsed() >= threshold,
            None => false,
        }
    }

    /// Returns this section's contribution to overall completion (0-100).
    ///
    /// Loaded sections count as complete; loading sections contribute their
    /// reported progress.
    pub fn completion_percent(&self) -> u8 {
        match self.state {
            SectionState::Loaded => 100,
            SectionState::Loading => self.progress.unwrap_or(0).min(100),
            SectionState::Idle | SectionState::Error => 0,
        }
    }
}

/// Partial update merged into a section record.
///
/// Unset fields leave the record untouched; `error` and `progress` can be
/// explicitly cleared. Whenever `last_updated` is among the merged fields the
/// store recomputes `is_stale` against the active threshold - this is the
/// single path by which staleness changes.
#[derive(Debug)]
pub struct SectionUpdate<T> {
    pub(crate) data: Option<T>,
    pub(crate) state: Option<SectionState>,
    pub(crate) error: Option<Option<String>>,
    pub(crate) last_updated: Option<Instant>,
    pub(crate) progress: Option<Option<u8>>,
}

impl<T> Default for SectionUpdate<T> {
    fn default() -> Self {
        Self {
            data: None,
            state: None,
            error: None,
            last_updated: None,
            progress: None,
        }
    }
}

impl<T> SectionUpdate<T> {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the section's payload.
    pub fn data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the load state.
    pub fn state(mut self, state: SectionState) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the error message.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(Some(message.into()));
        self
    }

    /// Clears the error message.
    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    /// Sets the last-updated timestamp.
    pub fn last_updated(mut self, at: Instant) -> Self {
        self.last_updated = Some(at);
        self
    }

    /// Sets the last-updated timestamp to now.
    pub fn touch(self) -> Self {
        self.last_updated(Instant::now())
    }

    /// Sets the progress percentage, clamped to 100.
    pub fn progress(mut self, percent: u8) -> Self {
        self.progress = Some(Some(percent.min(100)));
        self
    }

    /// Clears the progress percentage.
    pub fn clear_progress(mut self) -> Self {
        self.progress = Some(None);
        self
    }

    /// Returns true if this update touches the last-updated timestamp.
    pub(crate) fn touches_last_updated(&self) -> bool {
        self.last_updated.is_some()
    }
}
