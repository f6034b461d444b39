//! Notifier fake for unit tests.

use crate::Notifier;
use async_trait::async_trait;
use std::sync::Mutex;

/// Records every message instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_owned());
    }
}
