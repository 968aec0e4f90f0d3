//! User-visible notification channel.
//!
//! Notifications are single-line, toast-like messages with an `error` or
//! `success` severity. Sending is fire-and-forget: there is no
//! acknowledgement, and a full or closed channel drops the message with a
//! log line instead of blocking the sender.

use tokio::sync::mpsc;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Something the user asked for did not happen.
    Error,
    /// Confirmation of a completed action.
    Success,
}

/// A single toast-like message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    /// Severity shown to the user.
    pub severity: Severity,
    /// One-line message text.
    pub message: String,
}

impl Notification {
    /// An error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// A success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Success => write!(f, "ok: {}", self.message),
        }
    }
}

/// Sending half of the notification channel.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Creates a notifier and the receiver that drains it.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Posts a notification without waiting.
    pub fn notify(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::warn!(message = %dropped.message, "notification channel full, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                tracing::debug!(message = %dropped.message, "notification channel closed");
            }
        }
    }

    /// Shorthand for posting an error notification.
    pub fn error(&self, message: impl Into<String>) {
        self.notify(Notification::error(message));
    }
}
