use async_trait::async_trait;
use std::sync::Mutex;

use crate::plugins::traits::{Notification, Notifier};

/// Notifier that keeps everything it is handed, in order.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns and clears what was recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn dispatch(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}
