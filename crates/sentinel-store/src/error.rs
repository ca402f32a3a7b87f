use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("progress for chain {chain_id} would move backwards: {current} -> {attempted}")]
    NonMonotonicProgress {
        chain_id: u64,
        current: u64,
        attempted: u64,
    },
}

impl From<StoreError> for sentinel_core::SentinelError {
    fn from(e: StoreError) -> Self {
        let rendered = e.to_string();
        match e {
            StoreError::Storage(s) => sentinel_core::SentinelError::Storage(s),
            StoreError::Serialization(s) => sentinel_core::SentinelError::Serialization(s),
            StoreError::NonMonotonicProgress { .. } => sentinel_core::SentinelError::Storage(rendered),
        }
    }
}
