//! Live websocket feed from the masternode.
//!
//! Maintains one auto-reconnecting connection. Each `{event, data}` envelope
//! is dispatched by event name: `latest_block` refreshes the `block_latest`
//! cursor, `new_block` additionally hands the decoded block to a detached
//! ingest worker. Unknown events are ignored. The loop is infinite; the
//! only exit is process termination.

use crate::metrics::METRICS;
use anyhow::Context;
use futures::{SinkExt, StreamExt};
use lamden_indexer_config::{ConfigStore, WsConfig};
use lamden_indexer_ingest::IngestWriter;
use lamden_indexer_notifier::Notifier;
use lamden_indexer_storage_api::Store;
use lamden_indexer_types::Block;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Bytes, Message};

mod metrics;


#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

pub struct LiveFeed<S> {
    config: Arc<ConfigStore>,
    writer: Arc<IngestWriter<S>>,
    notifier: Arc<dyn Notifier>,
}

impl<S: Store> LiveFeed<S> {
    pub fn new(
        config: Arc<ConfigStore>,
        writer: Arc<IngestWriter<S>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            writer,
            notifier,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            let ws = self.config.ws().await;
            match self.connect_and_listen(&ws).await {
                Ok(()) => tracing::warn!("websocket connection closed by remote"),
                Err(err) => {
                    tracing::error!(%err, "websocket error");
                    self.notifier.send(&format!("Websocket error: {err}")).await;
                }
            }
            tracing::info!(delay_secs = ws.reconnect.as_secs(), "reconnecting websocket");
            tokio::time::sleep(ws.reconnect).await;
        }
    }

    async fn connect_and_listen(&self, ws: &WsConfig) -> anyhow::Result<()> {
        let (stream, _) = tokio::time::timeout(ws.timeout, connect_async(ws.masternode.as_str()))
            .await
            .context("websocket connect timed out")?
            .context("websocket connect failed")?;
        tracing::info!(url = %ws.masternode, "websocket connected");

        let (mut sink, mut source) = stream.split();
        let mut ping = tokio::time::interval(ws.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ping.tick().await;

        // A healthy masternode talks at least once per ping round-trip.
        let idle = ws.ping_interval + ws.ping_timeout;

        loop {
            tokio::select! {
                _ = ping.tick() => {
                    sink.send(Message::Ping(Bytes::new()))
                        .await
                        .context("failed to send ping")?;
                }
                message = tokio::time::timeout(idle, source.next()) => {
                    let message = message.context("websocket idle timeout")?;
                    match message {
                        None => return Ok(()),
                        Some(Err(err)) => return Err(err).context("websocket read failed"),
                        Some(Ok(Message::Text(text))) => {
                            let _worker = self.handle_event(text.as_str()).await;
                        }
                        Some(Ok(_)) => {} // pongs and binary frames
                    }
                }
            }
        }
    }

    /// Dispatches one envelope. Returns the spawned ingest worker, if any.
    async fn handle_event(&self, raw: &str) -> Option<JoinHandle<()>> {
        let envelope: Envelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(%err, "undecodable websocket message");
                return None;
            }
        };

        match envelope.event.as_str() {
            "latest_block" => {
                METRICS.events[&"latest_block"].inc();
                if let Some(block_latest) = self.update_latest(envelope.data).await {
                    tracing::debug!(block_latest, "updated live tip");
                }
                None
            }
            "new_block" => {
                METRICS.events[&"new_block"].inc();
                let block = match Block::decode(envelope.data) {
                    Ok(block) => block,
                    Err(err) => {
                        tracing::warn!(%err, "undecodable new_block payload");
                        return None;
                    }
                };
                if let Err(err) = self.config.set_block_latest(block.number).await {
                    tracing::warn!(%err, "could not persist block_latest");
                }

                // The worker owns the block's write path end-to-end,
                // independent of the catch-up walk.
                let writer = self.writer.clone();
                Some(tokio::spawn(async move {
                    if let Err(err) = writer.process(&block).await {
                        tracing::error!(block_number = block.number, ?err, "live ingest failed");
                    }
                }))
            }
            other => {
                tracing::trace!(event = other, "ignoring unknown event");
                None
            }
        }
    }

    async fn update_latest(&self, data: Value) -> Option<u64> {
        let block = match Block::decode(data) {
            Ok(block) => block,
            Err(err) => {
                tracing::warn!(%err, "undecodable latest_block payload");
                return None;
            }
        };
        if let Err(err) = self.config.set_block_latest(block.number).await {
            tracing::warn!(%err, "could not persist block_latest");
            return None;
        }
        Some(block.number)
    }
}
