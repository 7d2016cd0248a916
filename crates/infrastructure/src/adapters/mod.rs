//! Small system adapters: clock and notification sink.

use chrono::{DateTime, Utc};
use tally_application::ports::{Clock, Notifier};
use tally_domain::Notification;

/// System clock implementation using the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Notification sink that logs through `tracing`.
///
/// Stands in for the toast subsystem wherever no UI is attached; a real
/// frontend supplies its own [`Notifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Creates a new tracing-backed notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::warn!(
            header = %notification.header,
            message = %notification.message,
            "notification"
        );
    }
}
