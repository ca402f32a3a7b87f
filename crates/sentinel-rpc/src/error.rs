use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error calling {method}: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("node returned an RPC error for {method}: {message}")]
    Node { method: String, message: String },

    #[error("malformed response for {method}: {reason}")]
    Decode { method: String, reason: String },

    #[error("{method} exceeded retry budget ({attempts} attempts)")]
    RetriesExhausted { method: String, attempts: u32 },

    #[error("cancelled")]
    Cancelled,
}

impl From<RpcError> for sentinel_core::SentinelError {
    fn from(e: RpcError) -> Self {
        sentinel_core::SentinelError::Other(anyhow::anyhow!(e))
    }
}
