use super::*;
use serde_json::json;

fn store_with(contents: serde_json::Value) -> (tempfile::TempDir, ConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, contents.to_string()).unwrap();
    (dir, ConfigStore::load(path).unwrap())
}

#[tokio::test]
async fn set_is_durable_across_reload() {
    let (dir, store) = store_with(json!({}));

    store.set_block_latest(42).await.unwrap();
    store.set_sync_end(7).await.unwrap();
    drop(store);

    let reloaded = ConfigStore::load(dir.path().join("config.json")).unwrap();
    assert_eq!(reloaded.block_latest().await, Some(42));
    assert_eq!(reloaded.sync_end().await, Some(7));
}

#[tokio::test]
async fn sync_start_null_means_unset() {
    let (_dir, store) = store_with(json!({"sync_start": 99}));
    assert_eq!(store.sync_start().await, Some(99));

    store.set_sync_start(None).await.unwrap();
    assert_eq!(store.sync_start().await, None);

    store.set_sync_start(Some(5)).await.unwrap();
    assert_eq!(store.sync_start().await, Some(5));
}

#[tokio::test]
async fn missing_keys_fall_back_to_defaults() {
    let (_dir, store) = store_with(json!({}));

    assert!(!store.genesis_processed().await);
    assert!(store.retrieve_from().await.is_empty());
    assert!(!store.save_blocks_to_file().await);
    assert_eq!(store.job_interval_sync().await.as_secs(), 60);
    assert!(store.telegram().await.is_none());
}

#[tokio::test]
async fn source_list_parses_host_and_wait() {
    let (_dir, store) = store_with(json!({
        "retrieve_from": [
            {"host": "https://a.example/blocks/{block}", "wait": 0},
            {"host": "https://b.example/{block}", "wait": 2}
        ]
    }));

    let sources = store.retrieve_from().await;
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[1].wait, 2);
    assert!(sources[0].host.contains("{block}"));
}

#[tokio::test]
async fn mistyped_value_reads_as_unset() {
    let (_dir, store) = store_with(json!({"block_latest": "not a number"}));
    assert_eq!(store.block_latest().await, None);
}
