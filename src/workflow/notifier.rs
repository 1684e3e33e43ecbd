//! User-facing notifications.
//!
//! Every notification is also logged, so operators see the same events the
//! user does. Diagnostic detail (error chains, addresses) is logged by the
//! caller and never put into the notification text.

use crate::workflow::types::{
    Notification, NotificationAction, NotificationLevel, NotificationReceiver, NotificationSender,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct Notifier {
    sender: NotificationSender,
}

impl Notifier {
    pub fn new(sender: NotificationSender) -> Self {
        Self { sender }
    }

    /// Create a notifier together with the receiving end for the UI.
    pub fn channel(buffer: usize) -> (Self, NotificationReceiver) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self::new(sender), receiver)
    }

    pub async fn notify(&self, level: NotificationLevel, message: impl Into<String>, action: Option<NotificationAction>) {
        let notification = Notification {
            level,
            message: message.into(),
            action,
            timestamp: u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default(),
        };

        match level {
            NotificationLevel::Error => error!("{}", notification.message),
            NotificationLevel::Warning => warn!("{}", notification.message),
            NotificationLevel::Success => info!("{}", notification.message),
        }

        // A slow or absent reader must never hold up a ledger run
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!("Notification dropped, receiver is full: {}", dropped.message);
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!("Notification dropped, receiver closed: {}", dropped.message);
            }
        }
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message, None).await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message, None).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message, None).await;
    }

    /// Error with a link the user can follow to fix it.
    pub async fn error_with_link(&self, message: impl Into<String>, label: &str, url: &str) {
        let action = NotificationAction {
            label: label.to_string(),
            url: url.to_string(),
        };
        self.notify(NotificationLevel::Error, message, Some(action)).await;
    }
}
