//! Preload entries and per-entry load records.

use std::time::{Duration, Instant};

/// A deferred UI panel registered for preloading.
///
/// Lower `priority` values are loaded first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadEntry {
    /// Panel identifier (e.g. "financial", "clients").
    pub id: String,
    /// Static priority; lower value = higher priority.
    pub priority: u8,
}

impl PreloadEntry {
    /// Creates a new entry.
    pub fn new(id: impl Into<String>, priority: u8) -> Self {
        Self {
            id: id.into(),
            priority,
        }
    }
}

/// Outcome state of a preload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadState {
    /// A load is in flight.
    Pending,
    /// The panel module loaded successfully.
    Loaded,
    /// The load failed; the panel's on-demand path remains authoritative.
    Error,
}

impl PreloadState {
    /// Returns the state name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Loaded => "loaded",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for PreloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record of one panel's most recent preload attempt.
#[derive(Debug, Clone)]
pub struct PreloadRecord {
    /// Current outcome state.
    pub state: PreloadState,
    /// When the attempt started.
    pub started_at: Instant,
    /// How long the attempt took, once settled.
    pub duration: Option<Duration>,
    /// Error message for failed attempts.
    pub error: Option<String>,
}

impl PreloadRecord {
    /// Creates a pending record starting now.
    pub fn pending() -> Self {
        Self {
            state: PreloadState::Pending,
            started_at: Instant::now(),
            duration: None,
            error: None,
        }
    }

    /// Settles the record as loaded, capturing the duration.
    pub fn settle_loaded(&mut self) {
        self.state = PreloadState::Loaded;
        self.duration = Some(self.started_at.elapsed());
        self.error = None;
    }

    /// Settles the record as failed, capturing the duration and error.
    pub fn settle_error(&mut self, message: impl Into<String>) {
        self.state = PreloadState::Error;
        self.duration = Some(self.started_at.elapsed());
        self.error = Some(message.into());
    }
}
