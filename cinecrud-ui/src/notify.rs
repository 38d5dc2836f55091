//! Transient notifications
//!
//! A notification may carry one action (e.g. "Undo"). The action can only be
//! invoked while the notification is shown; once its duration elapses the
//! opportunity is gone. Nothing fires on expiry.

use std::time::Duration;

use async_trait::async_trait;

/// How long an undo offer stays open
pub const UNDO_WINDOW: Duration = Duration::from_millis(6000);

/// Confirmation that an undo was applied (or failed)
pub const UNDO_RESULT_DURATION: Duration = Duration::from_millis(2500);

/// Warning that the remote source could not be reached
pub const LOAD_WARNING_DURATION: Duration = Duration::from_millis(4000);

/// Generic failure of a create/edit/delete
pub const ERROR_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    /// Label of the single action offered, if any
    pub action: Option<String>,
    pub duration: Duration,
}

impl Notification {
    /// Informational notice with a dismiss label
    pub fn info(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            action: None,
            duration,
        }
    }

    /// Notice offering `action` until `duration` elapses
    pub fn with_action(message: impl Into<String>, action: impl Into<String>, duration: Duration) -> Self {
        Self {
            message: message.into(),
            action: Some(action.into()),
            duration,
        }
    }

    /// Standard undo offer
    pub fn undo(message: impl Into<String>) -> Self {
        Self::with_action(message, "Undo", UNDO_WINDOW)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The user invoked the action before the deadline
    ActionInvoked,
    /// Expired or dismissed without invoking the action
    Dismissed,
}

/// Notification surface
///
/// `show` resolves exactly once: when the action is invoked, or when the
/// notification is dismissed or expires.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: Notification) -> NotificationOutcome;
}
