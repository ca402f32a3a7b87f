use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SentinelError;

/// EVM chain id (`eth_chainId`, decimal form). `1` = Ethereum mainnet,
/// `137` = Polygon, etc.
pub type ChainId = u64;

/// Unix timestamp in seconds. Signed to match `chrono`'s `DateTime<Utc>`
/// round-trip and the block-timestamp fields returned by JSON-RPC.
pub type Timestamp = i64;

/// A 20-byte EVM address, stored and compared in lowercase-hex form.
///
/// Lowercasing happens exactly once, in [`Address::from_hex`] — every other
/// constructor and comparison relies on that invariant rather than
/// re-normalizing at each call site.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parses a `0x`-prefixed or bare hex address, lowercasing the result.
    pub fn from_hex(s: &str) -> Result<Self, SentinelError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(trimmed)
            .map_err(|e| SentinelError::InvalidAddress(format!("{s}: {e}")))?;
        let arr: [u8; 20] = decoded
            .try_into()
            .map_err(|_| SentinelError::InvalidAddress(format!("{s}: expected 20 bytes")))?;
        Ok(Address(arr))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = SentinelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

/// A 32-byte hash: an Ethereum transaction hash, block hash, or a
/// `CallScheduled` operation id — all three share this shape.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash32([u8; 32]);

impl Hash32 {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash32(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, SentinelError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let decoded =
            hex::decode(trimmed).map_err(|e| SentinelError::InvalidHash(format!("{s}: {e}")))?;
        let arr: [u8; 32] = decoded
            .try_into()
            .map_err(|_| SentinelError::InvalidHash(format!("{s}: expected 32 bytes")))?;
        Ok(Hash32(arr))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Hash32 {
    type Err = SentinelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash32::from_hex(s)
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self.to_hex())
    }
}

/// Alias used wherever a hash plays the role of an Ethereum transaction hash,
/// to keep call sites self-documenting.
pub type TxHash = Hash32;

/// The on-chain identity of one timelock proposal: Compound's
/// `QueueTransaction.txHash` parameter, or OpenZeppelin's `CallScheduled.id`.
/// Both are bytes32, so the same newtype carries either.
pub type FlowId = Hash32;

/// Which timelock contract family produced an event or owns a flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelockStandard {
    Compound,
    OpenZeppelin,
}

impl TimelockStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelockStandard::Compound => "compound",
            TimelockStandard::OpenZeppelin => "openzeppelin",
        }
    }
}

impl fmt::Display for TimelockStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimelockStandard {
    type Err = SentinelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compound" => Ok(TimelockStandard::Compound),
            "openzeppelin" | "oz" => Ok(TimelockStandard::OpenZeppelin),
            other => Err(SentinelError::InvalidStandard(other.to_string())),
        }
    }
}

/// Lifecycle status of a flow. See the state diagram in the flow engine for
/// the exact transition rules; `executed`, `cancelled`, and `expired` are
/// terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowStatus {
    Waiting,
    Ready,
    Executed,
    Cancelled,
    Expired,
}

impl FlowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowStatus::Executed | FlowStatus::Cancelled | FlowStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Waiting => "waiting",
            FlowStatus::Ready => "ready",
            FlowStatus::Executed => "executed",
            FlowStatus::Cancelled => "cancelled",
            FlowStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an on-chain transaction carrying a decoded event succeeded or
/// reverted. Failed-tx events are still stored (§3) but never drive a flow
/// transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trips_and_lowercases() {
        let a = Address::from_hex("0xAAbb00000000000000000000000000000000Cc").unwrap();
        assert_eq!(a.to_hex(), "0xaabb00000000000000000000000000000000cc");
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert!(Address::from_hex("0xabcd").is_err());
    }

    #[test]
    fn standard_round_trips_through_str() {
        assert_eq!(
            "openzeppelin".parse::<TimelockStandard>().unwrap(),
            TimelockStandard::OpenZeppelin
        );
        assert_eq!("compound".parse::<TimelockStandard>().unwrap().as_str(), "compound");
        assert!("bogus".parse::<TimelockStandard>().is_err());
    }

    #[test]
    fn terminal_statuses_are_flagged() {
        assert!(FlowStatus::Executed.is_terminal());
        assert!(FlowStatus::Cancelled.is_terminal());
        assert!(FlowStatus::Expired.is_terminal());
        assert!(!FlowStatus::Waiting.is_terminal());
        assert!(!FlowStatus::Ready.is_terminal());
    }
}
