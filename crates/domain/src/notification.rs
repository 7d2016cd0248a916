//! User-facing notification value.

/// A classified (header, message) pair handed to the notification
/// subsystem. The core only produces these; rendering them as toasts is
/// presentation's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short headline, e.g. "Session Expired".
    pub header: String,
    /// Body copy, possibly multi-line.
    pub message: String,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(header: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            message: message.into(),
        }
    }
}
