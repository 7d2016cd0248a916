//! Notification sink port

use tally_domain::Notification;

/// Port for pushing classified failures to the notification subsystem.
///
/// Rendering (toasts, banners) is presentation's job; the core only
/// produces the `(header, message)` pairs.
pub trait Notifier: Send + Sync {
    /// Delivers one notification. Fire-and-forget.
    fn notify(&self, notification: &Notification);
}
