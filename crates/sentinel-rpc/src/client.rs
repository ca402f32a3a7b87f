use std::time::Duration;

use rand::Rng;
use sentinel_core::{Address, Hash32};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::RpcError;
use crate::types::{BlockHeader, RawLog, TxReceipt};

/// Retry/backoff policy shared by every call this client makes. Exponential
/// with full jitter, capped at `max_delay`.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: sentinel_core::DEFAULT_RPC_RETRY_MAX,
            initial_delay: Duration::from_millis(sentinel_core::DEFAULT_RPC_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(sentinel_core::DEFAULT_RPC_RETRY_MAX_DELAY_MS),
        }
    }
}

/// A thin JSON-RPC 2.0 client bound to a single chain's resolved RPC URL.
///
/// Only the four read-only `eth_*` verbs the scanner needs are exposed; this
/// deliberately stays a raw HTTP + serde_json envelope rather than a full
/// typed `eth_*` client crate — four verbs do not justify a code-generated
/// contract-binding SDK.
pub struct EvmRpcClient {
    chain_id: u64,
    url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl EvmRpcClient {
    pub fn new(chain_id: u64, url: String, timeout: Duration, retry: RetryPolicy) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a bounded timeout");
        EvmRpcClient {
            chain_id,
            url,
            http,
            retry,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Makes one JSON-RPC round trip, with no retry. Retrying is the
    /// responsibility of [`Self::call_with_retry`], kept as a separate layer
    /// so every public method shares one retry implementation.
    async fn call_once(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|source| RpcError::Transport {
                method: method.to_string(),
                source,
            })?;

        let json: Value = resp.json().await.map_err(|source| RpcError::Transport {
            method: method.to_string(),
            source,
        })?;

        if let Some(err) = json.get("error") {
            return Err(RpcError::Node {
                method: method.to_string(),
                message: err.to_string(),
            });
        }

        Ok(json.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn call_with_retry(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut delay = self.retry.initial_delay;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.call_once(method, params.clone()).await {
                Ok(v) => return Ok(v),
                Err(e) if attempt >= self.retry.max_attempts => {
                    warn!(chain_id = self.chain_id, method, attempts = attempt, error = %e, "rpc retries exhausted");
                    return Err(RpcError::RetriesExhausted {
                        method: method.to_string(),
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    debug!(chain_id = self.chain_id, method, attempt, error = %e, "rpc call failed, retrying");
                    let jitter_ms = rand::thread_rng().gen_range(0..=delay.as_millis() as u64);
                    tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
                    delay = std::cmp::min(delay * 2, self.retry.max_delay);
                }
            }
        }
    }

    /// `eth_blockNumber`.
    pub async fn head_block(&self) -> Result<u64, RpcError> {
        let result = self.call_with_retry("eth_blockNumber", json!([])).await?;
        parse_quantity(&result, "eth_blockNumber")
    }

    /// `eth_getLogs` over an inclusive block range for a set of contract
    /// addresses, optionally filtered to a set of topic0 event signatures.
    pub async fn get_logs(
        &self,
        from_block: u64,
        to_block: u64,
        addresses: &[Address],
        topic0: Option<&[Hash32]>,
    ) -> Result<Vec<RawLog>, RpcError> {
        let mut filter = serde_json::Map::new();
        filter.insert("fromBlock".into(), json!(to_hex_quantity(from_block)));
        filter.insert("toBlock".into(), json!(to_hex_quantity(to_block)));
        filter.insert(
            "address".into(),
            json!(addresses.iter().map(|a| a.to_hex()).collect::<Vec<_>>()),
        );
        if let Some(sigs) = topic0 {
            filter.insert(
                "topics".into(),
                json!([sigs.iter().map(|h| h.to_hex()).collect::<Vec<_>>()]),
            );
        }

        let result = self
            .call_with_retry("eth_getLogs", json!([Value::Object(filter)]))
            .await?;

        let raw_logs = result.as_array().ok_or_else(|| RpcError::Decode {
            method: "eth_getLogs".to_string(),
            reason: "expected array result".to_string(),
        })?;

        raw_logs.iter().map(parse_log).collect()
    }

    /// `eth_getBlockByNumber` with `full_tx=false` — only the header fields
    /// this workspace needs (number, hash, timestamp) are parsed.
    pub async fn get_block(&self, number: u64) -> Result<BlockHeader, RpcError> {
        let result = self
            .call_with_retry(
                "eth_getBlockByNumber",
                json!([to_hex_quantity(number), false]),
            )
            .await?;

        if result.is_null() {
            return Err(RpcError::Decode {
                method: "eth_getBlockByNumber".to_string(),
                reason: format!("block {number} not found"),
            });
        }

        let hash = field_str(&result, "hash", "eth_getBlockByNumber")?;
        let timestamp = field_quantity(&result, "timestamp", "eth_getBlockByNumber")?;

        Ok(BlockHeader {
            number,
            hash: Hash32::from_hex(&hash).map_err(|e| RpcError::Decode {
                method: "eth_getBlockByNumber".to_string(),
                reason: e.to_string(),
            })?,
            timestamp: timestamp as i64,
        })
    }

    /// `eth_getTransactionReceipt`.
    pub async fn get_receipt(&self, tx_hash: Hash32) -> Result<TxReceipt, RpcError> {
        let result = self
            .call_with_retry("eth_getTransactionReceipt", json!([tx_hash.to_hex()]))
            .await?;

        if result.is_null() {
            return Err(RpcError::Decode {
                method: "eth_getTransactionReceipt".to_string(),
                reason: format!("receipt for {tx_hash} not found"),
            });
        }

        let from_hex = field_str(&result, "from", "eth_getTransactionReceipt")?;
        let to_hex = result.get("to").and_then(|v| v.as_str());
        let status_hex = field_str(&result, "status", "eth_getTransactionReceipt")?;

        Ok(TxReceipt {
            tx_hash,
            from: Address::from_hex(&from_hex).map_err(|e| RpcError::Decode {
                method: "eth_getTransactionReceipt".to_string(),
                reason: e.to_string(),
            })?,
            to: to_hex
                .map(Address::from_hex)
                .transpose()
                .map_err(|e| RpcError::Decode {
                    method: "eth_getTransactionReceipt".to_string(),
                    reason: e.to_string(),
                })?,
            status_success: status_hex == "0x1",
        })
    }
}

fn to_hex_quantity(v: u64) -> String {
    format!("0x{v:x}")
}

fn parse_quantity(value: &Value, method: &str) -> Result<u64, RpcError> {
    let s = value.as_str().ok_or_else(|| RpcError::Decode {
        method: method.to_string(),
        reason: "expected hex quantity string".to_string(),
    })?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| RpcError::Decode {
        method: method.to_string(),
        reason: format!("invalid hex quantity {s}: {e}"),
    })
}

fn field_str(value: &Value, field: &str, method: &str) -> Result<String, RpcError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| RpcError::Decode {
            method: method.to_string(),
            reason: format!("missing field `{field}`"),
        })
}

fn field_quantity(value: &Value, field: &str, method: &str) -> Result<u64, RpcError> {
    let v = value.get(field).ok_or_else(|| RpcError::Decode {
        method: method.to_string(),
        reason: format!("missing field `{field}`"),
    })?;
    parse_quantity(v, method)
}

fn parse_log(value: &Value) -> Result<RawLog, RpcError> {
    let method = "eth_getLogs";
    let address = Address::from_hex(&field_str(value, "address", method)?).map_err(|e| {
        RpcError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        }
    })?;

    let topics: Vec<Hash32> = value
        .get("topics")
        .and_then(|v| v.as_array())
        .ok_or_else(|| RpcError::Decode {
            method: method.to_string(),
            reason: "missing field `topics`".to_string(),
        })?
        .iter()
        .map(|t| {
            t.as_str()
                .ok_or_else(|| RpcError::Decode {
                    method: method.to_string(),
                    reason: "topic is not a string".to_string(),
                })
                .and_then(|s| {
                    Hash32::from_hex(s).map_err(|e| RpcError::Decode {
                        method: method.to_string(),
                        reason: e.to_string(),
                    })
                })
        })
        .collect::<Result<_, _>>()?;

    let data_hex = field_str(value, "data", method)?;
    let data = hex::decode(data_hex.trim_start_matches("0x")).map_err(|e| RpcError::Decode {
        method: method.to_string(),
        reason: format!("invalid log data: {e}"),
    })?;

    Ok(RawLog {
        address,
        topics,
        data,
        block_number: field_quantity(value, "blockNumber", method)?,
        block_hash: Hash32::from_hex(&field_str(value, "blockHash", method)?).map_err(|e| {
            RpcError::Decode {
                method: method.to_string(),
                reason: e.to_string(),
            }
        })?,
        tx_hash: Hash32::from_hex(&field_str(value, "transactionHash", method)?).map_err(|e| {
            RpcError::Decode {
                method: method.to_string(),
                reason: e.to_string(),
            }
        })?,
        tx_index: field_quantity(value, "transactionIndex", method)?,
        log_index: field_quantity(value, "logIndex", method)?,
        removed: value
            .get("removed")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_hex_quantity_formats_correctly() {
        assert_eq!(to_hex_quantity(255), "0xff");
        assert_eq!(to_hex_quantity(0), "0x0");
    }

    #[test]
    fn parse_quantity_accepts_hex_string() {
        let v = Value::String("0x1a".to_string());
        assert_eq!(parse_quantity(&v, "test").unwrap(), 26);
    }

    #[test]
    fn parse_quantity_rejects_non_string() {
        let v = Value::Number(5.into());
        assert!(parse_quantity(&v, "test").is_err());
    }

    #[test]
    fn parse_log_reads_required_fields() {
        let v = json!({
            "address": "0x0000000000000000000000000000000000000001",
            "topics": ["0x00000000000000000000000000000000000000000000000000000000000001"],
            "data": "0xdead",
            "blockNumber": "0xa",
            "blockHash": "0x0000000000000000000000000000000000000000000000000000000000000b",
            "transactionHash": "0x000000000000000000000000000000000000000000000000000000000000cc",
            "transactionIndex": "0x0",
            "logIndex": "0x1",
            "removed": false
        });
        let log = parse_log(&v).unwrap();
        assert_eq!(log.block_number, 10);
        assert_eq!(log.log_index, 1);
        assert_eq!(log.data, vec![0xde, 0xad]);
    }
}
