use super::testonly::ScriptedClient;
use super::*;
use lamden_indexer_notifier::testonly::RecordingNotifier;
use lamden_indexer_storage_api::WriteStore;
use lamden_indexer_storage_api::testonly::InMemoryStore;
use serde_json::json;
use tempfile::TempDir;

struct Harness {
    _config_dir: TempDir,
    store: Arc<InMemoryStore>,
    client: Arc<ScriptedClient>,
    notifier: Arc<RecordingNotifier>,
    fetcher: BlockFetcher<InMemoryStore>,
}

fn harness(config: Value) -> Harness {
    let config_dir = tempfile::tempdir().unwrap();
    let path = config_dir.path().join("config.json");
    std::fs::write(&path, config.to_string()).unwrap();
    let config = Arc::new(ConfigStore::load(path).unwrap());

    let store = Arc::new(InMemoryStore::new());
    let client = Arc::new(ScriptedClient::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let fetcher = BlockFetcher::new(
        store.clone(),
        config,
        client.clone() as Arc<dyn FetchClient>,
        notifier.clone() as Arc<dyn Notifier>,
    );

    Harness {
        _config_dir: config_dir,
        store,
        client,
        notifier,
        fetcher,
    }
}

fn two_sources() -> Value {
    json!({
        "retrieve_from": [
            {"host": "https://a.example/{block}", "wait": 0},
            {"host": "https://b.example/{block}", "wait": 1}
        ]
    })
}

fn raw_block(number: u64) -> Value {
    json!({
        "number": number,
        "hash": format!("h{number}"),
        "previous": format!("h{}", number.saturating_sub(1)),
        "hlc_timestamp": "2023-02-05T13:22:49.330440704Z_0"
    })
}

#[tokio::test(start_paused = true)]
async fn falls_back_to_next_source_on_error_payload() {
    let h = harness(two_sources());
    h.client
        .respond("https://a.example/7", json!({"error": "unknown"}));
    h.client.respond("https://b.example/7", raw_block(7));

    let started = tokio::time::Instant::now();
    let block = h.fetcher.get(&BlockId::Number(7), false).await.unwrap().unwrap();

    assert_eq!(block.number, 7);
    // Source B's one-second pre-wait was honored.
    assert_eq!(started.elapsed(), Duration::from_secs(1));
    assert_eq!(
        h.client.calls(),
        vec!["https://a.example/7", "https://b.example/7"]
    );
}

#[tokio::test(start_paused = true)]
async fn falls_back_on_transport_failure() {
    let h = harness(two_sources());
    h.client.fail("https://a.example/9");
    h.client.respond("https://b.example/9", raw_block(9));

    let block = h.fetcher.get(&BlockId::Number(9), false).await.unwrap().unwrap();
    assert_eq!(block.number, 9);
}

#[tokio::test(start_paused = true)]
async fn block_does_not_exist_sentinel_moves_on() {
    let h = harness(two_sources());
    h.client.respond(
        "https://a.example/9",
        json!({"hash": "block-does-not-exist"}),
    );
    h.client.respond("https://b.example/9", raw_block(9));

    let block = h.fetcher.get(&BlockId::Number(9), false).await.unwrap().unwrap();
    assert_eq!(block.number, 9);
}

#[tokio::test]
async fn store_hit_skips_the_network() {
    let h = harness(two_sources());
    h.store
        .upsert_block(5, "h5", &raw_block(5), "2023-02-05T13:22:49.330440704Z")
        .await
        .unwrap();

    let block = h.fetcher.get(&BlockId::Number(5), true).await.unwrap().unwrap();

    assert!(block.from_store);
    assert_eq!(block.number, 5);
    assert!(h.client.calls().is_empty());
}

#[tokio::test]
async fn store_consult_can_be_disabled() {
    let h = harness(json!({
        "retrieve_from": [{"host": "https://a.example/{block}", "wait": 0}]
    }));
    h.store
        .upsert_block(5, "h5", &raw_block(5), "2023-02-05T13:22:49.330440704Z")
        .await
        .unwrap();
    h.client.respond("https://a.example/5", raw_block(5));

    let block = h.fetcher.get(&BlockId::Number(5), false).await.unwrap().unwrap();

    assert!(!block.from_store);
    assert_eq!(h.client.calls().len(), 1);
}

#[tokio::test]
async fn hash_ids_substitute_into_the_template() {
    let h = harness(json!({
        "retrieve_from": [{"host": "https://a.example/{block}", "wait": 0}]
    }));
    let hash: String = std::iter::repeat_n('c', 64).collect();
    h.client
        .respond(format!("https://a.example/{hash}"), raw_block(33));

    let block = h
        .fetcher
        .get(&BlockId::Hash(hash.clone()), true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(block.number, 33);
    assert_eq!(h.client.calls(), vec![format!("https://a.example/{hash}")]);
}

#[tokio::test(start_paused = true)]
async fn exhausted_sources_notify_and_return_none() {
    let h = harness(two_sources());
    h.client.fail("https://a.example/7");
    h.client
        .respond("https://b.example/7", json!({"error": "unknown"}));

    let block = h.fetcher.get(&BlockId::Number(7), false).await.unwrap();

    assert!(block.is_none());
    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("no host able to deliver block 7"));
}

#[tokio::test]
async fn genesis_request_falls_back_to_bundled_file() {
    let genesis_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        genesis_dir.path().join("genesis_block.json"),
        json!({
            "number": 0,
            "hash": "genesis-hash",
            "previous": "pseudo-previous",
            "hlc_timestamp": "2022-01-01T00:00:00.000000000Z_0"
        })
        .to_string(),
    )
    .unwrap();

    let h = harness(json!({
        "retrieve_from": [{"host": "https://a.example/{block}", "wait": 0}],
        "genesis_block_dir": genesis_dir.path()
    }));
    h.client.fail("https://a.example/0");

    let block = h.fetcher.get(&BlockId::Number(0), false).await.unwrap().unwrap();

    assert_eq!(block.number, 0);
    assert_eq!(block.hash, "genesis-hash");
    assert_eq!(block.timestamp, "-infinity");
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn source_served_genesis_prefers_bundled_file() {
    let genesis_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        genesis_dir.path().join("genesis_block.json"),
        json!({
            "number": 0,
            "hash": "bundled-genesis",
            "previous": "pseudo-previous",
            "hlc_timestamp": "2022-01-01T00:00:00.000000000Z_0"
        })
        .to_string(),
    )
    .unwrap();

    let h = harness(json!({
        "retrieve_from": [{"host": "https://a.example/{block}", "wait": 0}],
        "genesis_block_dir": genesis_dir.path()
    }));
    h.client.respond("https://a.example/0", raw_block(0));

    let block = h.fetcher.get(&BlockId::Number(0), false).await.unwrap().unwrap();
    assert_eq!(block.hash, "bundled-genesis");
}
