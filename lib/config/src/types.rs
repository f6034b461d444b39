use serde::Deserialize;
use std::time::Duration;

/// One entry of the prioritized block-source list. `host` is a URL template
/// containing `{block}`; `wait` is the pre-request pause in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockSource {
    pub host: String,
    #[serde(default)]
    pub wait: u64,
}

/// Websocket connection settings for the live feed.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub masternode: String,
    pub timeout: Duration,
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    pub reconnect: Duration,
}

/// Operator notification channel settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: i64,
}
