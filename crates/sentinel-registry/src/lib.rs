//! The scanner's view of "which contracts to watch": an in-memory,
//! periodically-refreshed cache over [`sentinel_store`]'s watched-contract
//! table. Writes (registration, import, deactivation) happen through the
//! HTTP layer and are out of scope here — this crate only reads.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use sentinel_core::{Address, ChainId, SentinelError, TimelockStandard};
use sentinel_store::{StoreDb, WatchedContract};

/// Active watched contracts for one chain, partitioned by standard — the
/// shape the scanner scheduler (C7) needs each tick.
#[derive(Clone, Debug, Default)]
pub struct ChainContracts {
    pub compound: Vec<WatchedContract>,
    pub openzeppelin: Vec<WatchedContract>,
}

impl ChainContracts {
    pub fn is_empty(&self) -> bool {
        self.compound.is_empty() && self.openzeppelin.is_empty()
    }
}

struct Cache {
    by_chain: HashMap<ChainId, ChainContracts>,
    loaded_at: Option<Instant>,
}

pub struct ContractRegistry {
    store: Arc<StoreDb>,
    refresh_interval: Duration,
    cache: Mutex<Cache>,
}

impl ContractRegistry {
    pub fn new(store: Arc<StoreDb>, refresh_interval: Duration) -> Self {
        ContractRegistry {
            store,
            refresh_interval,
            cache: Mutex::new(Cache { by_chain: HashMap::new(), loaded_at: None }),
        }
    }

    /// Active, per-chain, per-standard contract lists. Reloads from the
    /// store when the cache is absent or older than `refresh_interval`, so a
    /// newly-registered contract is picked up within one refresh window
    /// rather than only at process startup.
    pub async fn list_active_by_chain(&self, chain_id: ChainId) -> Result<ChainContracts, SentinelError> {
        let mut cache = self.cache.lock().await;
        let stale = match cache.loaded_at {
            Some(at) => at.elapsed() >= self.refresh_interval,
            None => true,
        };
        if stale {
            self.reload(&mut cache)?;
        }
        Ok(cache.by_chain.get(&chain_id).cloned().unwrap_or_default())
    }

    /// Forces an immediate reload, bypassing the refresh interval. Used by
    /// tests and by callers that just learned of a registration out of band.
    pub async fn force_refresh(&self) -> Result<(), SentinelError> {
        let mut cache = self.cache.lock().await;
        self.reload(&mut cache)
    }

    fn reload(&self, cache: &mut Cache) -> Result<(), SentinelError> {
        let all = self.store.list_contracts()?;
        let mut by_chain: HashMap<ChainId, ChainContracts> = HashMap::new();
        for contract in all {
            if !contract.is_active() {
                continue;
            }
            let entry = by_chain.entry(contract.chain_id).or_default();
            match contract.standard {
                TimelockStandard::Compound => entry.compound.push(contract),
                TimelockStandard::OpenZeppelin => entry.openzeppelin.push(contract),
            }
        }
        tracing::debug!(chains = by_chain.len(), "contract registry cache refreshed");
        cache.by_chain = by_chain;
        cache.loaded_at = Some(Instant::now());
        Ok(())
    }

    /// Single-contract lookup, bypassing the cache — used by the dispatcher
    /// (C10) when expanding a `StatusChanged` event's recipient set, where a
    /// stale cache would risk notifying the wrong (e.g. just-rotated) admin.
    pub async fn lookup(
        &self,
        standard: TimelockStandard,
        chain_id: ChainId,
        contract_address: Address,
    ) -> Result<Option<WatchedContract>, SentinelError> {
        Ok(self.store.get_contract(standard, chain_id, contract_address)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::Timestamp;
    use sentinel_store::{CompoundFields, ContractStatus, StandardFields};

    fn sample(chain_id: ChainId, address: Address, status: ContractStatus) -> WatchedContract {
        WatchedContract {
            standard: TimelockStandard::Compound,
            chain_id,
            contract_address: address,
            creator_address: Address::from_bytes([9u8; 20]),
            min_delay_seconds: 3600,
            grace_period_seconds: None,
            remark: None,
            status,
            imported: false,
            created_at: 1_700_000_000 as Timestamp,
            fields: StandardFields::Compound(CompoundFields { admin: Address::ZERO, pending_admin: None }),
        }
    }

    #[tokio::test]
    async fn only_active_contracts_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StoreDb::open(dir.path()).unwrap());
        let active = sample(1, Address::from_bytes([1u8; 20]), ContractStatus::Active);
        let inactive = sample(1, Address::from_bytes([2u8; 20]), ContractStatus::Inactive);
        store.put_contract(&active).unwrap();
        store.put_contract(&inactive).unwrap();

        let registry = ContractRegistry::new(store, Duration::from_secs(60));
        let contracts = registry.list_active_by_chain(1).await.unwrap();
        assert_eq!(contracts.compound.len(), 1);
        assert_eq!(contracts.compound[0].contract_address, active.contract_address);
    }

    #[tokio::test]
    async fn lookup_bypasses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StoreDb::open(dir.path()).unwrap());
        let registry = ContractRegistry::new(store.clone(), Duration::from_secs(60));
        assert!(registry
            .lookup(TimelockStandard::Compound, 1, Address::from_bytes([1u8; 20]))
            .await
            .unwrap()
            .is_none());

        let contract = sample(1, Address::from_bytes([1u8; 20]), ContractStatus::Active);
        store.put_contract(&contract).unwrap();
        assert!(registry
            .lookup(TimelockStandard::Compound, 1, Address::from_bytes([1u8; 20]))
            .await
            .unwrap()
            .is_some());
    }
}
