use sentinel_core::{Address, ChainId, FlowStatus, Hash32, TimelockStandard};

pub fn standard_tag(standard: TimelockStandard) -> u8 {
    match standard {
        TimelockStandard::Compound => 0,
        TimelockStandard::OpenZeppelin => 1,
    }
}

pub fn status_tag(status: FlowStatus) -> u8 {
    match status {
        FlowStatus::Waiting => 0,
        FlowStatus::Ready => 1,
        FlowStatus::Executed => 2,
        FlowStatus::Cancelled => 3,
        FlowStatus::Expired => 4,
    }
}

/// `(standard, chain_id, contract_address)` — the contract registry's
/// primary key. Big-endian chain id keeps the keyspace ordered so a future
/// "contracts on chain X" range scan stays possible even though today's
/// registry reads do a full-tree scan (the row count is small; see C6).
pub fn contract_key(standard: TimelockStandard, chain_id: ChainId, address: Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8 + 20);
    key.push(standard_tag(standard));
    key.extend_from_slice(&chain_id.to_be_bytes());
    key.extend_from_slice(address.as_bytes());
    key
}

/// `(tx_hash, contract_address, event_type, log_index)` — the event table's
/// unique key, enforcing idempotent ingestion (S4).
pub fn event_key(tx_hash: Hash32, contract_address: Address, event_type: &str, log_index: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 20 + event_type.len() + 8);
    key.extend_from_slice(tx_hash.as_bytes());
    key.extend_from_slice(contract_address.as_bytes());
    key.extend_from_slice(event_type.as_bytes());
    key.extend_from_slice(&log_index.to_be_bytes());
    key
}

/// `(standard, chain_id, contract_address, flow_id)` — the flow table's
/// unique key (I-3 in the testable properties).
pub fn flow_key(standard: TimelockStandard, chain_id: ChainId, contract_address: Address, flow_id: Hash32) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8 + 20 + 32);
    key.push(standard_tag(standard));
    key.extend_from_slice(&chain_id.to_be_bytes());
    key.extend_from_slice(contract_address.as_bytes());
    key.extend_from_slice(flow_id.as_bytes());
    key
}

/// Secondary index key used by the refresher's status-filtered scans:
/// `status_tag || flow_key`, so `flows_by_status` can prefix-scan on a
/// single status byte instead of reading the whole flow table per tick.
pub fn flow_status_index_key(status: FlowStatus, flow_key: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + flow_key.len());
    key.push(status_tag(status));
    key.extend_from_slice(flow_key);
    key
}

pub fn progress_key(chain_id: ChainId) -> [u8; 8] {
    chain_id.to_be_bytes()
}

/// `recipient_address || config_id` — keeps every config for one recipient
/// contiguous so [`recipient_configs_prefix`] can scan them in one pass.
pub fn notification_config_key(recipient_address: Address, config_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(20 + config_id.len());
    key.extend_from_slice(recipient_address.as_bytes());
    key.extend_from_slice(config_id.as_bytes());
    key
}

pub fn recipient_configs_prefix(recipient_address: Address) -> [u8; 20] {
    *recipient_address.as_bytes()
}

/// `(channel, config_id, flow_id, status_to)` — the notification dedup key
/// (I-6).
pub fn notification_key(channel: &str, config_id: &str, flow_id: Hash32, status_to: FlowStatus) -> Vec<u8> {
    let mut key = Vec::with_capacity(channel.len() + 1 + config_id.len() + 1 + 32 + 1);
    key.extend_from_slice(channel.as_bytes());
    key.push(0);
    key.extend_from_slice(config_id.as_bytes());
    key.push(0);
    key.extend_from_slice(flow_id.as_bytes());
    key.push(status_tag(status_to));
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_key_is_stable_for_equal_inputs() {
        let a = Address::from_bytes([1u8; 20]);
        let id = Hash32::from_bytes([2u8; 32]);
        let k1 = flow_key(TimelockStandard::Compound, 1, a, id);
        let k2 = flow_key(TimelockStandard::Compound, 1, a, id);
        assert_eq!(k1, k2);
    }

    #[test]
    fn different_standards_produce_different_keys() {
        let a = Address::from_bytes([1u8; 20]);
        let id = Hash32::from_bytes([2u8; 32]);
        let compound = flow_key(TimelockStandard::Compound, 1, a, id);
        let oz = flow_key(TimelockStandard::OpenZeppelin, 1, a, id);
        assert_ne!(compound, oz);
    }
}
