//! End-to-end smoke test for the flow pipeline.
//!
//! Exercises the scanner's downstream path directly — a synthesized decoded
//! event through [`FlowEngine::process_batch`], then the time-driven
//! refresher — without a real chain or RPC endpoint behind it.

use std::sync::Arc;
use std::time::Duration;

use sentinel_core::{Address, FlowStatus, Hash32, TimelockStandard, TxStatus};
use sentinel_decode::{DecodedEvent, OpenZeppelinEvent};
use sentinel_flow::{refresh_once, FlowEngine};
use sentinel_registry::ContractRegistry;
use sentinel_store::{ContractStatus, EventRow, OpenZeppelinFields, StandardFields, StoreDb, WatchedContract};

const CHAIN_ID: u64 = 1;

fn contract_address() -> Address {
    Address::from_bytes([0xABu8; 20])
}

fn flow_id() -> Hash32 {
    Hash32::from_bytes([0x42u8; 32])
}

fn watched_contract() -> WatchedContract {
    WatchedContract {
        standard: TimelockStandard::OpenZeppelin,
        chain_id: CHAIN_ID,
        contract_address: contract_address(),
        creator_address: Address::from_bytes([0x01u8; 20]),
        min_delay_seconds: 100,
        grace_period_seconds: None,
        remark: None,
        status: ContractStatus::Active,
        imported: false,
        created_at: 1_700_000_000,
        fields: StandardFields::OpenZeppelin(OpenZeppelinFields {
            proposers: vec![Address::from_bytes([0x02u8; 20])],
            executors: vec![Address::from_bytes([0x03u8; 20])],
            cancellers: vec![],
        }),
    }
}

fn call_scheduled_event(block_timestamp: i64, tx_hash: Hash32) -> EventRow {
    let decoded = DecodedEvent::OpenZeppelin(OpenZeppelinEvent::CallScheduled {
        id: flow_id(),
        index: 0,
        target: Address::from_bytes([0x09u8; 20]),
        value: "0".to_string(),
        data: vec![0xde, 0xad, 0xbe, 0xef],
        predecessor: Hash32::from_bytes([0u8; 32]),
        delay_seconds: 100,
    });
    EventRow {
        standard: TimelockStandard::OpenZeppelin,
        chain_id: CHAIN_ID,
        contract_address: contract_address(),
        block_number: 100,
        block_hash: Hash32::from_bytes([0x10u8; 32]),
        block_timestamp,
        tx_hash,
        tx_index: 0,
        log_index: 0,
        from_address: Some(Address::from_bytes([0x02u8; 20])),
        to_address: Some(contract_address()),
        event_type: "CallScheduled".to_string(),
        tx_status: TxStatus::Success,
        raw_args: serde_json::to_value(&decoded).unwrap(),
    }
}

fn call_executed_event(block_timestamp: i64, tx_hash: Hash32) -> EventRow {
    let decoded = DecodedEvent::OpenZeppelin(OpenZeppelinEvent::CallExecuted {
        id: flow_id(),
        index: 0,
        target: Address::from_bytes([0x09u8; 20]),
        value: "0".to_string(),
        data: vec![0xde, 0xad, 0xbe, 0xef],
    });
    EventRow {
        standard: TimelockStandard::OpenZeppelin,
        chain_id: CHAIN_ID,
        contract_address: contract_address(),
        block_number: 200,
        block_hash: Hash32::from_bytes([0x11u8; 32]),
        block_timestamp,
        tx_hash,
        tx_index: 0,
        log_index: 0,
        from_address: Some(Address::from_bytes([0x03u8; 20])),
        to_address: Some(contract_address()),
        event_type: "CallExecuted".to_string(),
        tx_status: TxStatus::Success,
        raw_args: serde_json::to_value(&decoded).unwrap(),
    }
}

#[tokio::test]
async fn scheduled_call_waits_then_becomes_ready_then_executed() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(StoreDb::open(dir.path()).unwrap());
    store.put_contract(&watched_contract()).unwrap();

    let registry = Arc::new(ContractRegistry::new(store.clone(), Duration::from_millis(0)));
    let flow_engine = FlowEngine::new(store.clone(), registry.clone());

    let scheduled_at = 1_700_000_000;
    let scheduled = call_scheduled_event(scheduled_at, Hash32::from_bytes([0x20u8; 32]));
    let changes = flow_engine.process_batch(&[scheduled]).await.unwrap();
    assert!(changes.is_empty(), "a freshly created flow has nothing prior to diff against");

    let stored = store
        .get_flow(TimelockStandard::OpenZeppelin, CHAIN_ID, contract_address(), flow_id())
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, FlowStatus::Waiting);
    assert_eq!(stored.eta, Some(scheduled_at + 100));

    // Before the eta, the refresher leaves it alone.
    let changes = refresh_once(&store, scheduled_at + 50, 500).unwrap();
    assert!(changes.is_empty());

    // Once the eta has passed, the refresher flips it to ready.
    let changes = refresh_once(&store, scheduled_at + 101, 500).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].from, FlowStatus::Waiting);
    assert_eq!(changes[0].to, FlowStatus::Ready);

    // Execution on chain is a terminal transition the refresher never
    // revisits afterward.
    let executed_at = scheduled_at + 150;
    let executed = call_executed_event(executed_at, Hash32::from_bytes([0x21u8; 32]));
    let changes = flow_engine.process_batch(&[executed]).await.unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].from, FlowStatus::Ready);
    assert_eq!(changes[0].to, FlowStatus::Executed);

    let changes = refresh_once(&store, executed_at + 1_000_000, 500).unwrap();
    assert!(changes.is_empty(), "terminal flows are never touched by the refresher");
}

#[tokio::test]
async fn events_for_unregistered_contracts_are_skipped_without_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(StoreDb::open(dir.path()).unwrap());
    // No `put_contract` call: this contract is not registered.
    let registry = Arc::new(ContractRegistry::new(store.clone(), Duration::from_millis(0)));
    let flow_engine = FlowEngine::new(store.clone(), registry);

    let event = call_scheduled_event(1_700_000_000, Hash32::from_bytes([0x30u8; 32]));
    let changes = flow_engine.process_batch(&[event]).await.unwrap();
    assert!(changes.is_empty());
    assert!(store
        .get_flow(TimelockStandard::OpenZeppelin, CHAIN_ID, contract_address(), flow_id())
        .unwrap()
        .is_none());
}
