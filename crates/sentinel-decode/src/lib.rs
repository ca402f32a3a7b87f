//! sentinel-decode
//!
//! The event decoder (C3): turns a [`sentinel_rpc::RawLog`] into a typed
//! [`DecodedEvent`] for whichever timelock standard the watched contract
//! belongs to. Unknown event signatures are tolerated (returns `Ok(None)`)
//! so a future contract upgrade that adds events never fails ingestion —
//! only the two ABIs this workspace knows about are ever decoded.

pub mod abi;
pub mod error;

use ethabi::Token;
use serde::{Deserialize, Serialize};
use sentinel_core::{Address, Hash32, TimelockStandard, Timestamp};
use sentinel_rpc::RawLog;

pub use error::DecodeError;

/// A decoded Compound `Timelock.sol` event. Serializes into an
/// [`EventRow`](sentinel_store::EventRow)'s `raw_args` column so the flow
/// engine can read it back without re-decoding the original log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundEvent {
    QueueTransaction {
        flow_id: Hash32,
        target: Address,
        value: String,
        signature: String,
        data: Vec<u8>,
        eta: Timestamp,
    },
    ExecuteTransaction {
        flow_id: Hash32,
        target: Address,
        value: String,
        signature: String,
        data: Vec<u8>,
        eta: Timestamp,
    },
    CancelTransaction {
        flow_id: Hash32,
        target: Address,
        value: String,
        signature: String,
        data: Vec<u8>,
        eta: Timestamp,
    },
    NewAdmin {
        new_admin: Address,
    },
    NewPendingAdmin {
        new_pending_admin: Address,
    },
    NewDelay {
        new_delay_seconds: i64,
    },
}

impl CompoundEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CompoundEvent::QueueTransaction { .. } => "QueueTransaction",
            CompoundEvent::ExecuteTransaction { .. } => "ExecuteTransaction",
            CompoundEvent::CancelTransaction { .. } => "CancelTransaction",
            CompoundEvent::NewAdmin { .. } => "NewAdmin",
            CompoundEvent::NewPendingAdmin { .. } => "NewPendingAdmin",
            CompoundEvent::NewDelay { .. } => "NewDelay",
        }
    }

    pub fn flow_id(&self) -> Option<Hash32> {
        match self {
            CompoundEvent::QueueTransaction { flow_id, .. }
            | CompoundEvent::ExecuteTransaction { flow_id, .. }
            | CompoundEvent::CancelTransaction { flow_id, .. } => Some(*flow_id),
            _ => None,
        }
    }
}

/// A decoded OpenZeppelin `TimelockController` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenZeppelinEvent {
    CallScheduled {
        id: Hash32,
        index: u64,
        target: Address,
        value: String,
        data: Vec<u8>,
        predecessor: Hash32,
        delay_seconds: i64,
    },
    CallExecuted {
        id: Hash32,
        index: u64,
        target: Address,
        value: String,
        data: Vec<u8>,
    },
    Cancelled {
        id: Hash32,
    },
    MinDelayChange {
        old_delay_seconds: i64,
        new_delay_seconds: i64,
    },
    RoleGranted {
        role: Hash32,
        account: Address,
    },
    RoleRevoked {
        role: Hash32,
        account: Address,
    },
    RoleAdminChanged {
        role: Hash32,
    },
}

impl OpenZeppelinEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OpenZeppelinEvent::CallScheduled { .. } => "CallScheduled",
            OpenZeppelinEvent::CallExecuted { .. } => "CallExecuted",
            OpenZeppelinEvent::Cancelled { .. } => "Cancelled",
            OpenZeppelinEvent::MinDelayChange { .. } => "MinDelayChange",
            OpenZeppelinEvent::RoleGranted { .. } => "RoleGranted",
            OpenZeppelinEvent::RoleRevoked { .. } => "RoleRevoked",
            OpenZeppelinEvent::RoleAdminChanged { .. } => "RoleAdminChanged",
        }
    }

    pub fn flow_id(&self) -> Option<Hash32> {
        match self {
            OpenZeppelinEvent::CallScheduled { id, .. }
            | OpenZeppelinEvent::CallExecuted { id, .. }
            | OpenZeppelinEvent::Cancelled { id } => Some(*id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedEvent {
    Compound(CompoundEvent),
    OpenZeppelin(OpenZeppelinEvent),
}

impl DecodedEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DecodedEvent::Compound(e) => e.event_type(),
            DecodedEvent::OpenZeppelin(e) => e.event_type(),
        }
    }
}

/// Derives a 4-byte function selector from call data for display purposes,
/// matching the heuristic used when OZ calls don't carry a Solidity
/// `signature` string the way Compound's queue event does.
pub fn derive_function_selector(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    Some(format!("0x{}", hex::encode(&data[..4])))
}

/// Decodes one raw log against the given standard's ABI. Returns `Ok(None)`
/// for any topic0 this workspace doesn't recognize — tolerated, not an
/// error, since future contract upgrades may add events.
pub fn decode_log(
    standard: TimelockStandard,
    log: &RawLog,
) -> Result<Option<DecodedEvent>, DecodeError> {
    let Some(topic0) = log.topics.first() else {
        return Ok(None);
    };

    match standard {
        TimelockStandard::Compound => decode_compound(*topic0, log),
        TimelockStandard::OpenZeppelin => decode_openzeppelin(*topic0, log),
    }
}

fn to_raw_log(log: &RawLog) -> ethabi::RawLog {
    ethabi::RawLog {
        topics: log.topics.iter().map(|t| ethabi::Hash::from(*t.as_bytes())).collect(),
        data: log.data.clone(),
    }
}

fn decode_compound(
    topic0: Hash32,
    log: &RawLog,
) -> Result<Option<DecodedEvent>, DecodeError> {
    let table = abi::COMPOUND.by_topic0();
    let Some((_, event, name)) = table.iter().find(|(t, _, _)| *t == topic0) else {
        return Ok(None);
    };

    let parsed = event
        .parse_log(to_raw_log(log))
        .map_err(|source| DecodeError::Abi { event: name, source })?;
    let params = ParamLookup::new(*name, &parsed.params);

    let result = match *name {
        "QueueTransaction" => CompoundEvent::QueueTransaction {
            flow_id: params.hash("txHash")?,
            target: params.address("target")?,
            value: params.uint_decimal("value")?,
            signature: params.string("signature")?,
            data: params.bytes("data")?,
            eta: params.uint_i64("eta")?,
        },
        "ExecuteTransaction" => CompoundEvent::ExecuteTransaction {
            flow_id: params.hash("txHash")?,
            target: params.address("target")?,
            value: params.uint_decimal("value")?,
            signature: params.string("signature")?,
            data: params.bytes("data")?,
            eta: params.uint_i64("eta")?,
        },
        "CancelTransaction" => CompoundEvent::CancelTransaction {
            flow_id: params.hash("txHash")?,
            target: params.address("target")?,
            value: params.uint_decimal("value")?,
            signature: params.string("signature")?,
            data: params.bytes("data")?,
            eta: params.uint_i64("eta")?,
        },
        "NewAdmin" => CompoundEvent::NewAdmin {
            new_admin: params.address("newAdmin")?,
        },
        "NewPendingAdmin" => CompoundEvent::NewPendingAdmin {
            new_pending_admin: params.address("newPendingAdmin")?,
        },
        "NewDelay" => CompoundEvent::NewDelay {
            new_delay_seconds: params.uint_i64("newDelay")?,
        },
        _ => return Ok(None),
    };

    Ok(Some(DecodedEvent::Compound(result)))
}

fn decode_openzeppelin(
    topic0: Hash32,
    log: &RawLog,
) -> Result<Option<DecodedEvent>, DecodeError> {
    let table = abi::OPENZEPPELIN.by_topic0();
    let Some((_, event, name)) = table.iter().find(|(t, _, _)| *t == topic0) else {
        return Ok(None);
    };

    let parsed = event
        .parse_log(to_raw_log(log))
        .map_err(|source| DecodeError::Abi { event: name, source })?;
    let params = ParamLookup::new(*name, &parsed.params);

    let result = match *name {
        "CallScheduled" => OpenZeppelinEvent::CallScheduled {
            id: params.hash("id")?,
            index: params.uint_u64("index")?,
            target: params.address("target")?,
            value: params.uint_decimal("value")?,
            data: params.bytes("data")?,
            predecessor: params.hash("predecessor")?,
            delay_seconds: params.uint_i64("delay")?,
        },
        "CallExecuted" => OpenZeppelinEvent::CallExecuted {
            id: params.hash("id")?,
            index: params.uint_u64("index")?,
            target: params.address("target")?,
            value: params.uint_decimal("value")?,
            data: params.bytes("data")?,
        },
        "Cancelled" => OpenZeppelinEvent::Cancelled { id: params.hash("id")? },
        "MinDelayChange" => OpenZeppelinEvent::MinDelayChange {
            old_delay_seconds: params.uint_i64("oldDuration")?,
            new_delay_seconds: params.uint_i64("newDuration")?,
        },
        "RoleGranted" => OpenZeppelinEvent::RoleGranted {
            role: params.hash("role")?,
            account: params.address("account")?,
        },
        "RoleRevoked" => OpenZeppelinEvent::RoleRevoked {
            role: params.hash("role")?,
            account: params.address("account")?,
        },
        "RoleAdminChanged" => OpenZeppelinEvent::RoleAdminChanged {
            role: params.hash("role")?,
        },
        _ => return Ok(None),
    };

    Ok(Some(DecodedEvent::OpenZeppelin(result)))
}

/// Looks up a decoded log's named parameters and converts them into
/// workspace newtypes, following the same "match the token variant or bail"
/// shape as the reference Ethereum client's `extract_address`/`extract_uint`
/// helpers.
struct ParamLookup<'a> {
    event: &'static str,
    params: &'a [ethabi::LogParam],
}

impl<'a> ParamLookup<'a> {
    fn new(event: &'static str, params: &'a [ethabi::LogParam]) -> Self {
        ParamLookup { event, params }
    }

    fn find(&self, name: &'static str) -> Result<&Token, DecodeError> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
            .ok_or(DecodeError::MissingParam { event: self.event, param: name })
    }

    fn address(&self, name: &'static str) -> Result<Address, DecodeError> {
        match self.find(name)? {
            Token::Address(a) => Ok(Address::from_bytes(a.0)),
            _ => Err(DecodeError::WrongTokenShape { event: self.event, param: name }),
        }
    }

    fn hash(&self, name: &'static str) -> Result<Hash32, DecodeError> {
        match self.find(name)? {
            Token::FixedBytes(bytes) if bytes.len() == 32 => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(bytes);
                Ok(Hash32::from_bytes(arr))
            }
            _ => Err(DecodeError::WrongTokenShape { event: self.event, param: name }),
        }
    }

    fn string(&self, name: &'static str) -> Result<String, DecodeError> {
        match self.find(name)? {
            Token::String(s) => Ok(s.clone()),
            _ => Err(DecodeError::WrongTokenShape { event: self.event, param: name }),
        }
    }

    fn bytes(&self, name: &'static str) -> Result<Vec<u8>, DecodeError> {
        match self.find(name)? {
            Token::Bytes(b) => Ok(b.clone()),
            _ => Err(DecodeError::WrongTokenShape { event: self.event, param: name }),
        }
    }

    fn uint_decimal(&self, name: &'static str) -> Result<String, DecodeError> {
        match self.find(name)? {
            Token::Uint(u) => Ok(u.to_string()),
            _ => Err(DecodeError::WrongTokenShape { event: self.event, param: name }),
        }
    }

    fn uint_i64(&self, name: &'static str) -> Result<i64, DecodeError> {
        match self.find(name)? {
            Token::Uint(u) => Ok(u.low_u64() as i64),
            _ => Err(DecodeError::WrongTokenShape { event: self.event, param: name }),
        }
    }

    fn uint_u64(&self, name: &'static str) -> Result<u64, DecodeError> {
        match self.find(name)? {
            Token::Uint(u) => Ok(u.low_u64()),
            _ => Err(DecodeError::WrongTokenShape { event: self.event, param: name }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_topic_is_tolerated() {
        let log = RawLog {
            address: Address::ZERO,
            topics: vec![Hash32::from_bytes([0xffu8; 32])],
            data: vec![],
            block_number: 1,
            block_hash: Hash32::from_bytes([0u8; 32]),
            tx_hash: Hash32::from_bytes([1u8; 32]),
            tx_index: 0,
            log_index: 0,
            removed: false,
        };
        assert!(decode_log(TimelockStandard::Compound, &log).unwrap().is_none());
    }

    #[test]
    fn log_with_no_topics_is_tolerated() {
        let log = RawLog {
            address: Address::ZERO,
            topics: vec![],
            data: vec![],
            block_number: 1,
            block_hash: Hash32::from_bytes([0u8; 32]),
            tx_hash: Hash32::from_bytes([1u8; 32]),
            tx_index: 0,
            log_index: 0,
            removed: false,
        };
        assert!(decode_log(TimelockStandard::OpenZeppelin, &log).unwrap().is_none());
    }

    #[test]
    fn derive_function_selector_requires_four_bytes() {
        assert!(derive_function_selector(&[1, 2, 3]).is_none());
        assert_eq!(
            derive_function_selector(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee]).unwrap(),
            "0xaabbccdd"
        );
    }

    #[test]
    fn decodes_new_admin_event() {
        let mut admin_bytes = [0u8; 32];
        admin_bytes[12..].copy_from_slice(&[0x11; 20]);
        let log = RawLog {
            address: Address::ZERO,
            topics: vec![
                abi::COMPOUND.all_topics()[3],
                Hash32::from_bytes(admin_bytes),
            ],
            data: vec![],
            block_number: 1,
            block_hash: Hash32::from_bytes([0u8; 32]),
            tx_hash: Hash32::from_bytes([1u8; 32]),
            tx_index: 0,
            log_index: 0,
            removed: false,
        };
        let decoded = decode_log(TimelockStandard::Compound, &log).unwrap().unwrap();
        match decoded {
            DecodedEvent::Compound(CompoundEvent::NewAdmin { new_admin }) => {
                assert_eq!(new_admin.to_hex(), "0x1111111111111111111111111111111111111111");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }
}
