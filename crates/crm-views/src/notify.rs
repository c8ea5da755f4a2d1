//! User-facing notifications.

use tokio::sync::mpsc;
use tracing::debug;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A short message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Sending half of the notification channel. Cheap to clone.
///
/// Notifications sent after the receiver is gone are dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl Notifier {
    /// Create a notifier and the receiver that displays its notifications.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that discards everything.
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn notify(&self, notification: Notification) {
        debug!(level = ?notification.level, message = %notification.message, "Notify");
        if let Some(tx) = &self.tx {
            let _ = tx.send(notification);
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Notification::success(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Notification::error(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_are_delivered_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.success("Message sent!");
        notifier.error("Failed to send message");

        assert_eq!(rx.try_recv().unwrap(), Notification::success("Message sent!"));
        assert_eq!(
            rx.try_recv().unwrap().level,
            NotificationLevel::Error
        );
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.success("nobody is listening");
        Notifier::silent().error("discarded");
    }
}
