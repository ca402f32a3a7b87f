use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("ethabi decode failed for {event}: {source}")]
    Abi {
        event: &'static str,
        #[source]
        source: ethabi::Error,
    },

    #[error("event {event} missing expected parameter `{param}`")]
    MissingParam {
        event: &'static str,
        param: &'static str,
    },

    #[error("event {event} parameter `{param}` had unexpected token shape")]
    WrongTokenShape {
        event: &'static str,
        param: &'static str,
    },
}

impl From<DecodeError> for sentinel_core::SentinelError {
    fn from(e: DecodeError) -> Self {
        sentinel_core::SentinelError::Other(anyhow::anyhow!(e))
    }
}
