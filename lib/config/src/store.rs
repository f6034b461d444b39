use crate::types::{BlockSource, TelegramConfig, WsConfig};
use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl ConfigStore {
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let data: Map<String, Value> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.data.read().await;
        let value = data.get(key)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(typed) => Some(typed),
            Err(err) => {
                tracing::warn!(key, %err, "mistyped config value, treating as unset");
                None
            }
        }
    }

    /// Sets a key and durably persists the whole document.
    pub async fn set(&self, key: &str, value: impl Serialize) -> anyhow::Result<()> {
        let value = serde_json::to_value(value).context("failed to serialize config value")?;
        let mut data = self.data.write().await;
        data.insert(key.to_owned(), value);
        dump(&self.path, &data)
    }

    // Sync cursors.

    pub async fn block_latest(&self) -> Option<u64> {
        self.get("block_latest").await
    }

    pub async fn set_block_latest(&self, number: u64) -> anyhow::Result<()> {
        self.set("block_latest", number).await
    }

    pub async fn sync_start(&self) -> Option<u64> {
        self.get("sync_start").await
    }

    /// `None` means "resume from the live tip" and is stored as JSON null.
    pub async fn set_sync_start(&self, number: Option<u64>) -> anyhow::Result<()> {
        self.set("sync_start", number).await
    }

    pub async fn sync_end(&self) -> Option<u64> {
        self.get("sync_end").await
    }

    pub async fn set_sync_end(&self, number: u64) -> anyhow::Result<()> {
        self.set("sync_end", number).await
    }

    pub async fn genesis_processed(&self) -> bool {
        self.get("genesis_processed").await.unwrap_or(false)
    }

    pub async fn set_genesis_processed(&self, processed: bool) -> anyhow::Result<()> {
        self.set("genesis_processed", processed).await
    }

    // Operator-authored settings.

    pub async fn database_url(&self) -> Option<String> {
        self.get("database_url").await
    }

    pub async fn retrieve_from(&self) -> Vec<BlockSource> {
        self.get("retrieve_from").await.unwrap_or_default()
    }

    pub async fn genesis_block_dir(&self) -> PathBuf {
        self.get("genesis_block_dir")
            .await
            .unwrap_or_else(|| PathBuf::from("genesis"))
    }

    pub async fn block_dir(&self) -> PathBuf {
        self.get("block_dir")
            .await
            .unwrap_or_else(|| PathBuf::from("blocks"))
    }

    pub async fn save_blocks_to_file(&self) -> bool {
        self.get("save_blocks_to_file").await.unwrap_or(false)
    }

    pub async fn job_interval_sync(&self) -> Duration {
        Duration::from_secs(self.get("job_interval_sync").await.unwrap_or(60))
    }

    pub async fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.get("http_timeout").await.unwrap_or(30))
    }

    pub async fn ws(&self) -> WsConfig {
        WsConfig {
            masternode: self
                .get("ws_masternode")
                .await
                .unwrap_or_else(|| "wss://masternode-01.lamden.io".to_owned()),
            timeout: Duration::from_secs(self.get("ws_timeout").await.unwrap_or(30)),
            ping_interval: Duration::from_secs(self.get("ws_ping_interval").await.unwrap_or(10)),
            ping_timeout: Duration::from_secs(self.get("ws_ping_timeout").await.unwrap_or(10)),
            reconnect: Duration::from_secs(self.get("ws_reconnect").await.unwrap_or(5)),
        }
    }

    pub async fn telegram(&self) -> Option<TelegramConfig> {
        let token: String = self.get("telegram_token").await?;
        let notify: i64 = self.get("telegram_notify").await?;
        Some(TelegramConfig {
            token,
            chat_id: notify,
        })
    }

    pub async fn log_level(&self) -> Option<String> {
        self.get("log_level").await
    }

    pub async fn prometheus_port(&self) -> Option<u16> {
        self.get("prometheus_port").await
    }
}

fn dump(path: &Path, data: &Map<String, Value>) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(&Value::Object(data.clone())).context("serialize config")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, rendered)
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
