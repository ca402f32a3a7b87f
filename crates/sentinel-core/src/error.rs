use thiserror::Error;

use crate::types::FlowStatus;

/// Crate-wide error type for domain-level failures shared across every
/// `sentinel-*` crate. Transport- and storage-specific errors live closer to
/// their own boundary (`sentinel-rpc::RpcError`, `sentinel-store::StoreError`,
/// ...) and convert into this type at the seams where the core composes them.
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("unknown chain id {0}")]
    UnknownChain(u64),

    #[error("chain {0} has no rpc url template configured for provider {1:?}")]
    MissingRpcUrl(u64, String),

    #[error("no active chains configured")]
    NoActiveChains,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid timelock standard: {0}")]
    InvalidStandard(String),

    #[error("invalid flow status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: FlowStatus, to: FlowStatus },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
