//! User-facing notifications (the toast channel)

use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Sink for messages shown to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::Error(message.to_string()));
    }
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Success(message) => info!("✅ {}", message),
            Notification::Error(message) => error!("❌ {}", message),
        }
    }
}

#[cfg(test)]
pub use recording::RecordingNotifier;
