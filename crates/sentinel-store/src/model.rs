use serde::{Deserialize, Serialize};

use sentinel_core::{
    Address, ChainId, FlowStatus, Hash32, TimelockStandard, Timestamp, TxStatus,
    DEFAULT_GRACE_PERIOD_SECS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Active,
    Inactive,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompoundFields {
    pub admin: Address,
    pub pending_admin: Option<Address>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenZeppelinFields {
    pub proposers: Vec<Address>,
    pub executors: Vec<Address>,
    pub cancellers: Vec<Address>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StandardFields {
    Compound(CompoundFields),
    OpenZeppelin(OpenZeppelinFields),
}

/// A user-registered timelock contract (C6). Creation/soft-delete happens
/// through the HTTP layer; the core only reads this row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchedContract {
    pub standard: TimelockStandard,
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub creator_address: Address,
    pub min_delay_seconds: i64,
    pub grace_period_seconds: Option<i64>,
    pub remark: Option<String>,
    pub status: ContractStatus,
    pub imported: bool,
    pub created_at: Timestamp,
    pub fields: StandardFields,
}

impl WatchedContract {
    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }

    /// Compound's grace period, sourced from this row rather than a live ABI
    /// read (see the open-question decision in the design ledger), falling
    /// back to the protocol default when unset.
    pub fn grace_period_seconds(&self) -> i64 {
        self.grace_period_seconds.unwrap_or(DEFAULT_GRACE_PERIOD_SECS)
    }

    /// Every address that should receive a notification when this
    /// contract's flows change state.
    pub fn recipient_addresses(&self) -> Vec<Address> {
        let mut addrs = vec![self.creator_address];
        match &self.fields {
            StandardFields::Compound(f) => {
                addrs.push(f.admin);
                if let Some(pending) = f.pending_admin {
                    addrs.push(pending);
                }
            }
            StandardFields::OpenZeppelin(f) => {
                addrs.extend(f.proposers.iter().copied());
                addrs.extend(f.executors.iter().copied());
                addrs.extend(f.cancellers.iter().copied());
            }
        }
        addrs.sort();
        addrs.dedup();
        addrs
    }
}

/// One decoded on-chain event (C5), append-only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRow {
    pub standard: TimelockStandard,
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub block_number: u64,
    pub block_hash: Hash32,
    pub block_timestamp: Timestamp,
    pub tx_hash: Hash32,
    pub tx_index: u64,
    pub log_index: u64,
    pub from_address: Option<Address>,
    pub to_address: Option<Address>,
    pub event_type: String,
    pub tx_status: TxStatus,
    /// Event-specific decoded payload, carried as JSON so the store doesn't
    /// need a variant type per (standard, event_type) pair.
    pub raw_args: serde_json::Value,
}

impl EventRow {
    pub fn unique_key_parts(&self) -> (Hash32, Address, &str, u64) {
        (self.tx_hash, self.contract_address, self.event_type.as_str(), self.log_index)
    }
}

/// One timelock proposal's lifecycle row (C8 data, C9 drives its status).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flow {
    pub standard: TimelockStandard,
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub flow_id: Hash32,
    pub initiator_address: Option<Address>,
    pub target_address: Option<Address>,
    pub value: Option<String>,
    pub call_data: Option<Vec<u8>>,
    pub function_signature: Option<String>,
    pub eta: Option<Timestamp>,
    pub expired_at: Option<Timestamp>,
    pub status: FlowStatus,
    pub queue_tx_hash: Option<Hash32>,
    pub execute_tx_hash: Option<Hash32>,
    pub cancel_tx_hash: Option<Hash32>,
    pub executed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Flow {
    pub fn new(
        standard: TimelockStandard,
        chain_id: ChainId,
        contract_address: Address,
        flow_id: Hash32,
        now: Timestamp,
    ) -> Self {
        Flow {
            standard,
            chain_id,
            contract_address,
            flow_id,
            initiator_address: None,
            target_address: None,
            value: None,
            call_data: None,
            function_signature: None,
            eta: None,
            expired_at: None,
            status: FlowStatus::Waiting,
            queue_tx_hash: None,
            execute_tx_hash: None,
            cancel_tx_hash: None,
            executed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendStatus {
    Success,
    Failed,
}

/// Which downstream channel a [`NotificationConfig`] or
/// [`NotificationLogEntry`] targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    Email,
    Telegram,
    Lark,
    Feishu,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Telegram => "telegram",
            ChannelKind::Lark => "lark",
            ChannelKind::Feishu => "feishu",
        }
    }
}

/// The opaque, channel-specific connection payload a [`NotificationConfig`]
/// carries. CRUD for these lives in the HTTP layer (out of scope); the core
/// only reads them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NotificationPayload {
    Email { address: String },
    Telegram { bot_token: String, chat_id: String },
    /// Lark and Feishu share the same webhook+optional-HMAC-secret shape;
    /// `ChannelKind` on the owning row disambiguates which endpoint to hit.
    Webhook { webhook_url: String, secret: Option<String> },
}

/// One user's notification destination on one channel (C10 data, §3: "per
/// user, per channel, opaque connection payload"). Creation happens through
/// the HTTP layer; the dispatcher only reads active rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub config_id: String,
    pub recipient_address: Address,
    pub channel: ChannelKind,
    pub active: bool,
    pub payload: NotificationPayload,
}

/// One dedup/audit row for a single notification attempt (C10 data).
/// Unique key: `(channel, config_id, flow_id, status_to)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub channel: String,
    pub config_id: String,
    pub flow_id: Hash32,
    pub standard: TimelockStandard,
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub status_from: FlowStatus,
    pub status_to: FlowStatus,
    pub tx_hash: Option<Hash32>,
    pub send_status: SendStatus,
    pub error_message: Option<String>,
    pub sent_at: Timestamp,
}
