use sentinel_core::{Address, Hash32, Timestamp};

/// A single `eth_getLogs` row, still in raw (undecoded) form. [`sentinel-decode`]
/// turns these into typed events once the contract standard is known.
#[derive(Clone, Debug)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<Hash32>,
    pub data: Vec<u8>,
    pub block_number: u64,
    pub block_hash: Hash32,
    pub tx_hash: Hash32,
    pub tx_index: u64,
    pub log_index: u64,
    pub removed: bool,
}

/// The subset of `eth_getBlockByNumber` fields the scanner needs.
#[derive(Clone, Debug)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: Hash32,
    pub timestamp: Timestamp,
}

/// The subset of `eth_getTransactionReceipt` fields the scanner needs.
#[derive(Clone, Debug)]
pub struct TxReceipt {
    pub tx_hash: Hash32,
    pub from: Address,
    pub to: Option<Address>,
    pub status_success: bool,
}
