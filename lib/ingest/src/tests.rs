use super::*;
use lamden_indexer_storage_api::testonly::InMemoryStore;
use serde_json::{Value, json};
use tempfile::TempDir;

fn addr(c: char) -> String {
    std::iter::repeat_n(c, 64).collect()
}

fn config_with(extra: Value) -> (TempDir, Arc<ConfigStore>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, extra.to_string()).unwrap();
    let config = Arc::new(ConfigStore::load(path).unwrap());
    (dir, config)
}

fn writer() -> (TempDir, Arc<InMemoryStore>, IngestWriter<InMemoryStore>) {
    let (dir, config) = config_with(json!({}));
    let store = Arc::new(InMemoryStore::new());
    let writer = IngestWriter::new(store.clone(), config);
    (dir, store, writer)
}

fn transfer_block(number: u64, state_key: &str, state_value: Value) -> Block {
    Block::decode(json!({
        "number": number,
        "hash": format!("h{number}"),
        "previous": format!("h{}", number - 1),
        "hlc_timestamp": "2023-02-05T13:22:49.330440704Z_0",
        "processed": {
            "hash": format!("tx{number}"),
            "status": 0,
            "result": "None",
            "state": [{"key": state_key, "value": state_value}],
            "transaction": {
                "payload": {
                    "sender": addr('a'),
                    "contract": "currency",
                    "function": "transfer",
                    "kwargs": {"to": addr('b'), "amount": {"__fixed__": "10.0"}}
                }
            }
        },
        "rewards": []
    }))
    .unwrap()
}

#[tokio::test]
async fn live_block_produces_all_rows() {
    let (_dir, store, writer) = writer();
    let key = format!("currency.balances:{}", addr('a'));
    let block = transfer_block(42, &key, json!({"__fixed__": "90.0"}));

    writer.process(&block).await.unwrap();

    assert_eq!(store.block_count(), 1);
    assert_eq!(store.transaction_count(), 1);
    assert_eq!(store.address_count(), 2);
    let state = store.state_record(&key).unwrap();
    assert_eq!(state.block_num, 42);
    assert_eq!(state.value, json!({"__fixed__": "90.0"}));
    assert_eq!(store.address_record(&addr('a')), Some(42));
    assert_eq!(store.address_record(&addr('b')), Some(42));
}

#[tokio::test]
async fn reprocessing_is_idempotent() {
    let (_dir, store, writer) = writer();
    let key = format!("currency.balances:{}", addr('a'));
    let block = transfer_block(42, &key, json!({"__fixed__": "90.0"}));

    writer.process(&block).await.unwrap();
    writer.process(&block).await.unwrap();

    assert_eq!(store.block_count(), 1);
    assert_eq!(store.transaction_count(), 1);
    assert_eq!(store.state_count(), 1);
    assert_eq!(store.address_count(), 2);
    assert_eq!(store.reward_count(), 0);
}

#[tokio::test]
async fn older_state_write_is_discarded() {
    let (_dir, store, writer) = writer();

    writer
        .process(&transfer_block(50, "x", json!(1)))
        .await
        .unwrap();
    writer
        .process(&transfer_block(40, "x", json!(2)))
        .await
        .unwrap();

    let state = store.state_record("x").unwrap();
    assert_eq!(state.block_num, 50);
    assert_eq!(state.value, json!(1));
}

#[tokio::test]
async fn newer_state_write_wins() {
    let (_dir, store, writer) = writer();

    writer
        .process(&transfer_block(40, "x", json!(2)))
        .await
        .unwrap();
    writer
        .process(&transfer_block(50, "x", json!(1)))
        .await
        .unwrap();

    let state = store.state_record("x").unwrap();
    assert_eq!(state.block_num, 50);
    assert_eq!(state.value, json!(1));
}

#[tokio::test]
async fn addresses_keep_first_seen_block() {
    let (_dir, store, writer) = writer();

    writer
        .process(&transfer_block(50, "k", json!(1)))
        .await
        .unwrap();
    writer
        .process(&transfer_block(40, "k", json!(1)))
        .await
        .unwrap();
    writer
        .process(&transfer_block(45, "k", json!(1)))
        .await
        .unwrap();

    assert_eq!(store.address_record(&addr('a')), Some(40));
    assert_eq!(store.address_record(&addr('b')), Some(40));
}

#[tokio::test]
async fn invalid_transaction_skips_state_and_addresses() {
    let (_dir, store, writer) = writer();
    let block = Block::decode(json!({
        "number": 7,
        "hash": "h7",
        "previous": "h6",
        "hlc_timestamp": "2023-02-05T13:22:49.330440704Z_0",
        "processed": {
            "hash": "tx7",
            "status": 1,
            "result": "AssertionError: too poor",
            "state": [{"key": "x", "value": 1}],
            "transaction": {
                "payload": {"sender": addr('a'), "contract": "currency", "function": "transfer",
                            "kwargs": {"to": addr('b')}}
            }
        },
        "rewards": [
            {"key": "masternodes.votes", "value": {"__fixed__": "5"}, "reward": {"__fixed__": "0.5"}}
        ]
    }))
    .unwrap();

    writer.process(&block).await.unwrap();

    assert_eq!(store.block_count(), 1);
    assert_eq!(store.transaction_count(), 1);
    assert_eq!(store.reward_count(), 1);
    // Rewards still land in state, the transaction's own state does not.
    assert!(store.state_record("masternodes.votes").is_some());
    assert!(store.state_record("x").is_none());
    assert_eq!(store.address_count(), 0);
}

#[tokio::test]
async fn reward_state_respects_monotonicity() {
    let (_dir, store, writer) = writer();

    writer
        .process(&transfer_block(90, "masternodes.votes", json!("newer")))
        .await
        .unwrap();

    let block = Block::decode(json!({
        "number": 60,
        "hash": "h60",
        "previous": "h59",
        "hlc_timestamp": "2023-02-05T13:22:49.330440704Z_0",
        "rewards": [
            {"key": "masternodes.votes", "value": {"__fixed__": "5"}, "reward": {"__fixed__": "0.5"}}
        ]
    }))
    .unwrap();
    writer.process(&block).await.unwrap();

    assert_eq!(store.reward_count(), 1);
    let state = store.state_record("masternodes.votes").unwrap();
    assert_eq!(state.block_num, 90);
    assert_eq!(state.value, json!("newer"));
}

#[tokio::test]
async fn contract_submission_writes_contract_row() {
    let (_dir, store, writer) = writer();
    let code = "balances=Hash()\n\
        @export\ndef transfer(amount:float,to:str):\n    pass\n\
        @export\ndef approve(amount:float,to:str):\n    pass\n\
        @export\ndef transfer_from(amount:float,to:str,main_account:str):\n    pass";
    let block = Block::decode(json!({
        "number": 12,
        "hash": "h12",
        "previous": "h11",
        "hlc_timestamp": "2023-02-05T13:22:49.330440704Z_0",
        "processed": {
            "hash": "tx12",
            "status": 0,
            "state": [],
            "transaction": {
                "payload": {
                    "sender": addr('a'),
                    "contract": "submission",
                    "function": "submit_contract",
                    "kwargs": {"name": "con_token", "code": code}
                }
            }
        }
    }))
    .unwrap();

    writer.process(&block).await.unwrap();

    let contract = store.contract_record("con_token").unwrap();
    assert_eq!(contract.block_num, 12);
    assert!(contract.lst001);
    assert!(!contract.lst002);
    assert_eq!(contract.created, "2023-02-05T13:22:49.330440704Z");
}

#[tokio::test]
async fn store_failure_aborts_the_block() {
    let (_dir, store, writer) = writer();
    store.set_fail_writes(true);

    let block = transfer_block(5, "x", json!(1));
    assert!(writer.process(&block).await.is_err());
    assert_eq!(store.block_count(), 0);
}

#[tokio::test]
async fn raw_block_archival_is_optional() {
    let archive = tempfile::tempdir().unwrap();
    let (_dir, config) = config_with(json!({
        "save_blocks_to_file": true,
        "block_dir": archive.path().join("blocks")
    }));
    let store = Arc::new(InMemoryStore::new());
    let writer = IngestWriter::new(store, config);

    let block = transfer_block(42, "x", json!(1));
    writer.process(&block).await.unwrap();

    let archived = std::fs::read_to_string(archive.path().join("blocks/42.json")).unwrap();
    let parsed: Value = serde_json::from_str(&archived).unwrap();
    assert_eq!(parsed, block.content);
}
