/*!
 * User-facing notification channel.
 *
 * Every component operation reports its outcome as a `Notification` sent on
 * an unbounded channel. A single presentation layer owns the receiving end
 * and decides how to render them; the core never touches presentation state.
 */

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A single user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Sending half of the notification channel, cheap to clone
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<Notification>,
}

impl Notifier {
    /// Create a notifier and the receiver the presentation layer drains
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, notification: Notification) {
        // A dropped receiver just means nobody is listening any more
        if self.tx.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("notify(info): {}", message);
        self.notify(Notification::new(NotificationKind::Info, message));
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!("notify(success): {}", message);
        self.notify(Notification::new(NotificationKind::Success, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("notify(warning): {}", message);
        self.notify(Notification::new(NotificationKind::Warning, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!("notify(error): {}", message);
        self.notify(Notification::new(NotificationKind::Error, message));
    }
}

/// Drain every notification currently queued without waiting
pub fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut drained = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        drained.push(notification);
    }
    drained
}
