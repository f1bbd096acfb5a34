//! Notification sink for user-facing load outcomes.
//!
//! The coordinator reports load failures and batch outcomes to an injected
//! [`Notifier`] (a toast system, in the consuming dashboard). Notifications
//! are fire-and-forget: the sink is never awaited and its outcome is never
//! inspected.

use std::fmt::Arguments;

use tracing::{error, info, warn};

/// Visual severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVariant {
    /// Informational notice.
    Info,
    /// Successful completion.
    Success,
    /// Partial failure or degraded state.
    Warning,
    /// Hard failure.
    Error,
}

impl NotificationVariant {
    /// Returns the variant name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short headline (e.g. "Failed to load Financial Metrics").
    pub title: String,
    /// Longer description, usually the underlying error message.
    pub description: String,
    /// Visual severity.
    pub variant: NotificationVariant,
}

impl Notification {
    /// Creates a new notification.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        variant: NotificationVariant,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant,
        }
    }

    /// Creates an error notification.
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, NotificationVariant::Error)
    }

    /// Creates a warning notification.
    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, NotificationVariant::Warning)
    }

    /// Creates an informational notification.
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, NotificationVariant::Info)
    }
}

/// Sink for user-facing notifications.
///
/// Implementations must be `Send + Sync`; `notify` must not block, since it
/// is called from the load path.
pub trait Notifier: Send + Sync {
    /// Delivers a notification. Fire-and-forget.
    fn notify(&self, notification: Notification);
}

/// A notifier that discards all notifications.
///
/// Useful for tests and for embedding the coordinator where no toast
/// surface exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// A notifier that forwards notifications to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl TracingNotifier {
    fn emit(level: NotificationVariant, args: Arguments<'_>) {
        match level {
            NotificationVariant::Error => error!("{}", args),
            NotificationVariant::Warning => warn!("{}", args),
            _ => info!("{}", args),
        }
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        Self::emit(
            notification.variant,
            format_args!("{}: {}", notification.title, notification.description),
        );
    }
}
