//! Durable key/value configuration store.
//!
//! One JSON document backs both the operator-authored settings and the sync
//! cursors (`block_latest`, `sync_start`, `sync_end`, `genesis_processed`).
//! Every `set` rewrites the file through a temp-file rename, so cursors
//! survive a crash at any point.

mod store;
pub use store::ConfigStore;

mod types;
pub use types::{BlockSource, TelegramConfig, WsConfig};

#[cfg(test)]
mod tests;
