//! sentinel-rpc
//!
//! A minimal multi-chain JSON-RPC client (C2): `eth_blockNumber`,
//! `eth_getLogs`, `eth_getBlockByNumber`, `eth_getTransactionReceipt`, with
//! bounded exponential-backoff retry. One [`EvmRpcClient`] instance is bound
//! to a single chain's resolved RPC URL; the scanner scheduler owns one per
//! active chain.

pub mod client;
pub mod error;
pub mod types;

pub use client::{EvmRpcClient, RetryPolicy};
pub use error::RpcError;
pub use types::{BlockHeader, RawLog, TxReceipt};
