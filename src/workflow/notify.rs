//! Host-side seams the workflow reports through.

use std::fmt;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Surfaces terminal outcomes to the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, level: NotificationLevel, message: &str);
}

/// The window hosting one workflow instance.
pub trait Dialog: Send + Sync {
    /// Close after a submitted workflow reached a terminal state.
    fn close(&self);

    /// Dismiss without submitting.
    fn dismiss(&self);
}
