//! Fire-and-forget operator notifications.
//!
//! Delivery is best-effort: failures are logged and never surface to the
//! sync engine.

use async_trait::async_trait;
use lamden_indexer_config::TelegramConfig;
use std::sync::Arc;

pub mod testonly;

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, message: &str);
}

/// Telegram Bot API channel.
#[derive(Debug)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    token: String,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: config.token,
            chat_id: config.chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let body = serde_json::json!({ "chat_id": self.chat_id, "text": message });

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(status = %response.status(), "telegram rejected notification");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(%err, "could not deliver telegram notification"),
        }
    }
}

/// Used when no channel is configured.
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _message: &str) {}
}

/// Builds the configured channel, falling back to noop.
pub fn from_config(telegram: Option<TelegramConfig>) -> Arc<dyn Notifier> {
    match telegram {
        Some(config) => Arc::new(TelegramNotifier::new(config)),
        None => Arc::new(NoopNotifier),
    }
}
