use sentinel_core::{Address, ChainId, FlowStatus, Hash32, TimelockStandard};

use crate::error::StoreError;
use crate::keys;
use crate::model::{EventRow, Flow, NotificationConfig, NotificationLogEntry, WatchedContract};

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Embedded storage for everything the scanner, flow engine, and dispatcher
/// read and write: scan progress, watched contracts, decoded events, flow
/// rows, and the notification dedup log. One `sled::Db`, one `Tree` per
/// entity, `bincode` for the row encoding — mirrors the teacher's `StateDb`.
pub struct StoreDb {
    db: sled::Db,
    progress: sled::Tree,
    contracts: sled::Tree,
    events: sled::Tree,
    flows: sled::Tree,
    flow_status_index: sled::Tree,
    notifications: sled::Tree,
    notification_configs: sled::Tree,
}

impl StoreDb {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::Storage(e.to_string()))?;
        let open_tree = |name: &str| -> Result<sled::Tree, StoreError> {
            db.open_tree(name).map_err(|e| StoreError::Storage(e.to_string()))
        };
        Ok(StoreDb {
            progress: open_tree("progress")?,
            contracts: open_tree("contracts")?,
            events: open_tree("events")?,
            flows: open_tree("flows")?,
            flow_status_index: open_tree("flow_status_index")?,
            notifications: open_tree("notifications")?,
            notification_configs: open_tree("notification_configs")?,
            db,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush().map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    // ---- progress (C4) ----

    /// Last block number fully scanned and committed for a chain, or `None`
    /// before the first tick.
    pub fn get_progress(&self, chain_id: ChainId) -> Result<Option<u64>, StoreError> {
        let key = keys::progress_key(chain_id);
        match self.progress.get(key).map_err(|e| StoreError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Advances progress for `chain_id` to `block_number`. Rejects any
    /// attempt to move backwards (I-1): a scanner restart after a crash must
    /// resume, never re-walk already-committed blocks downward.
    pub fn advance_progress(&self, chain_id: ChainId, block_number: u64) -> Result<(), StoreError> {
        if let Some(current) = self.get_progress(chain_id)? {
            if block_number < current {
                return Err(StoreError::NonMonotonicProgress {
                    chain_id,
                    current,
                    attempted: block_number,
                });
            }
        }
        let key = keys::progress_key(chain_id);
        self.progress
            .insert(key, encode(&block_number)?)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    // ---- watched contracts (C6 data) ----

    pub fn put_contract(&self, contract: &WatchedContract) -> Result<(), StoreError> {
        let key = keys::contract_key(contract.standard, contract.chain_id, contract.contract_address);
        self.contracts
            .insert(key, encode(contract)?)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_contract(
        &self,
        standard: TimelockStandard,
        chain_id: ChainId,
        address: Address,
    ) -> Result<Option<WatchedContract>, StoreError> {
        let key = keys::contract_key(standard, chain_id, address);
        match self.contracts.get(key).map_err(|e| StoreError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All watched contracts, active and inactive. The registry layer (C6)
    /// is responsible for filtering and caching; the row count here is small
    /// enough that a full-tree scan is the right default.
    pub fn list_contracts(&self) -> Result<Vec<WatchedContract>, StoreError> {
        let mut out = Vec::new();
        for entry in self.contracts.iter() {
            let (_, value) = entry.map_err(|e| StoreError::Storage(e.to_string()))?;
            out.push(decode(&value)?);
        }
        Ok(out)
    }

    // ---- events (C5) ----

    /// Inserts an event row if its unique key hasn't been seen before.
    /// Returns `true` if the row was newly inserted, `false` if it was
    /// already present (I-4: re-scanning a block range must not duplicate
    /// rows).
    pub fn insert_event_if_absent(&self, event: &EventRow) -> Result<bool, StoreError> {
        let (tx_hash, contract_address, event_type, log_index) = event.unique_key_parts();
        let key = keys::event_key(tx_hash, contract_address, event_type, log_index);
        let encoded = encode(event)?;
        let prior = self
            .events
            .compare_and_swap(key, None as Option<&[u8]>, Some(encoded))
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(prior.is_ok())
    }

    // ---- flows (C8/C9) ----

    pub fn upsert_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        let key = keys::flow_key(flow.standard, flow.chain_id, flow.contract_address, flow.flow_id);

        if let Some(existing) = self.flows.get(&key).map_err(|e| StoreError::Storage(e.to_string()))? {
            let existing: Flow = decode(&existing)?;
            if existing.status != flow.status {
                let old_index_key = keys::flow_status_index_key(existing.status, &key);
                self.flow_status_index
                    .remove(old_index_key)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
            }
        }

        self.flows
            .insert(&key, encode(flow)?)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let index_key = keys::flow_status_index_key(flow.status, &key);
        self.flow_status_index
            .insert(index_key, key)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_flow(
        &self,
        standard: TimelockStandard,
        chain_id: ChainId,
        contract_address: Address,
        flow_id: Hash32,
    ) -> Result<Option<Flow>, StoreError> {
        let key = keys::flow_key(standard, chain_id, contract_address, flow_id);
        match self.flows.get(key).map_err(|e| StoreError::Storage(e.to_string()))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Flows currently in `status`, via the secondary index (C9): the
    /// refresher scans one status bucket per tick instead of the whole
    /// table.
    pub fn flows_by_status(&self, status: FlowStatus) -> Result<Vec<Flow>, StoreError> {
        let prefix = [keys::status_tag(status)];
        let mut out = Vec::new();
        for entry in self.flow_status_index.scan_prefix(prefix) {
            let (_, flow_key) = entry.map_err(|e| StoreError::Storage(e.to_string()))?;
            if let Some(bytes) = self.flows.get(&flow_key).map_err(|e| StoreError::Storage(e.to_string()))? {
                out.push(decode(&bytes)?);
            }
        }
        Ok(out)
    }

    // ---- notifications (C10) ----

    /// Returns `true` if a notification for this `(channel, config, flow,
    /// status_to)` combination has already been logged, regardless of
    /// whether the prior attempt succeeded (I-6: at-most-once delivery per
    /// transition, not per attempt).
    pub fn notification_already_sent(
        &self,
        channel: &str,
        config_id: &str,
        flow_id: Hash32,
        status_to: FlowStatus,
    ) -> Result<bool, StoreError> {
        let key = keys::notification_key(channel, config_id, flow_id, status_to);
        Ok(self
            .notifications
            .contains_key(key)
            .map_err(|e| StoreError::Storage(e.to_string()))?)
    }

    pub fn record_notification(&self, entry: &NotificationLogEntry) -> Result<(), StoreError> {
        let key = keys::notification_key(&entry.channel, &entry.config_id, entry.flow_id, entry.status_to);
        self.notifications
            .insert(key, encode(entry)?)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    // ---- notification configs (C10 data, out-of-scope CRUD writes) ----

    pub fn put_notification_config(&self, config: &NotificationConfig) -> Result<(), StoreError> {
        let key = keys::notification_config_key(config.recipient_address, &config.config_id);
        self.notification_configs
            .insert(key, encode(config)?)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Every config — active or not — for one recipient address. The
    /// dispatcher filters to `active` rows itself.
    pub fn configs_for_recipient(&self, recipient_address: Address) -> Result<Vec<NotificationConfig>, StoreError> {
        let prefix = keys::recipient_configs_prefix(recipient_address);
        let mut out = Vec::new();
        for entry in self.notification_configs.scan_prefix(prefix) {
            let (_, value) = entry.map_err(|e| StoreError::Storage(e.to_string()))?;
            out.push(decode(&value)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::TxStatus;

    fn temp_db() -> StoreDb {
        let dir = tempfile::tempdir().unwrap();
        StoreDb::open(dir.path()).unwrap()
    }

    fn sample_event(log_index: u64) -> EventRow {
        EventRow {
            standard: TimelockStandard::Compound,
            chain_id: 1,
            contract_address: Address::from_bytes([1u8; 20]),
            block_number: 100,
            block_hash: Hash32::from_bytes([2u8; 32]),
            block_timestamp: 1_700_000_000,
            tx_hash: Hash32::from_bytes([3u8; 32]),
            tx_index: 0,
            log_index,
            from_address: None,
            to_address: None,
            event_type: "QueueTransaction".to_string(),
            tx_status: TxStatus::Success,
            raw_args: serde_json::json!({}),
        }
    }

    #[test]
    fn progress_rejects_backwards_moves() {
        let db = temp_db();
        db.advance_progress(1, 100).unwrap();
        assert_eq!(db.get_progress(1).unwrap(), Some(100));
        let err = db.advance_progress(1, 50).unwrap_err();
        assert!(matches!(err, StoreError::NonMonotonicProgress { .. }));
    }

    #[test]
    fn event_insert_is_idempotent() {
        let db = temp_db();
        let event = sample_event(0);
        assert!(db.insert_event_if_absent(&event).unwrap());
        assert!(!db.insert_event_if_absent(&event).unwrap());
    }

    #[test]
    fn flow_status_index_tracks_moves_between_buckets() {
        let db = temp_db();
        let address = Address::from_bytes([9u8; 20]);
        let flow_id = Hash32::from_bytes([7u8; 32]);
        let mut flow = Flow::new(TimelockStandard::Compound, 1, address, flow_id, 1_700_000_000);
        db.upsert_flow(&flow).unwrap();
        assert_eq!(db.flows_by_status(FlowStatus::Waiting).unwrap().len(), 1);

        flow.status = FlowStatus::Ready;
        db.upsert_flow(&flow).unwrap();
        assert!(db.flows_by_status(FlowStatus::Waiting).unwrap().is_empty());
        assert_eq!(db.flows_by_status(FlowStatus::Ready).unwrap().len(), 1);
    }

    #[test]
    fn notification_dedup_tracks_per_transition() {
        let db = temp_db();
        let flow_id = Hash32::from_bytes([4u8; 32]);
        assert!(!db.notification_already_sent("email", "cfg-1", flow_id, FlowStatus::Ready).unwrap());

        let entry = NotificationLogEntry {
            channel: "email".to_string(),
            config_id: "cfg-1".to_string(),
            flow_id,
            standard: TimelockStandard::Compound,
            chain_id: 1,
            contract_address: Address::from_bytes([1u8; 20]),
            status_from: FlowStatus::Waiting,
            status_to: FlowStatus::Ready,
            tx_hash: None,
            send_status: crate::model::SendStatus::Success,
            error_message: None,
            sent_at: 1_700_000_000,
        };
        db.record_notification(&entry).unwrap();
        assert!(db.notification_already_sent("email", "cfg-1", flow_id, FlowStatus::Ready).unwrap());
        assert!(!db.notification_already_sent("email", "cfg-1", flow_id, FlowStatus::Executed).unwrap());
    }

    #[test]
    fn recipient_configs_are_scoped_per_address() {
        let db = temp_db();
        let alice = Address::from_bytes([1u8; 20]);
        let bob = Address::from_bytes([2u8; 20]);
        db.put_notification_config(&crate::model::NotificationConfig {
            config_id: "cfg-alice-email".to_string(),
            recipient_address: alice,
            channel: crate::model::ChannelKind::Email,
            active: true,
            payload: crate::model::NotificationPayload::Email { address: "alice@example.com".to_string() },
        })
        .unwrap();
        db.put_notification_config(&crate::model::NotificationConfig {
            config_id: "cfg-bob-telegram".to_string(),
            recipient_address: bob,
            channel: crate::model::ChannelKind::Telegram,
            active: true,
            payload: crate::model::NotificationPayload::Telegram {
                bot_token: "t".to_string(),
                chat_id: "c".to_string(),
            },
        })
        .unwrap();

        assert_eq!(db.configs_for_recipient(alice).unwrap().len(), 1);
        assert_eq!(db.configs_for_recipient(bob).unwrap().len(), 1);
    }
}
