//! User-facing notifications.
//!
//! The core only defines the payload and the [`Notifier`] seam. The
//! application layer owns the single-slot center that displays them.

use serde::{Deserialize, Serialize};

/// Monotonic identifier of a shown notification.
pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        };
        f.write_str(label)
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
}

/// Sink for user-facing messages.
pub trait Notifier: Send + Sync {
    /// Shows `message`, replacing whatever is currently shown.
    fn notify(&self, message: &str, kind: NotificationKind) -> NotificationId;

    fn success(&self, message: &str) -> NotificationId {
        self.notify(message, NotificationKind::Success)
    }

    fn error(&self, message: &str) -> NotificationId {
        self.notify(message, NotificationKind::Error)
    }
}
