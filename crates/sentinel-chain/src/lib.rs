//! sentinel-chain
//!
//! The chain registry (C1): an immutable, in-memory lookup table of every
//! chain the scanner is eligible to watch, built once at startup from a seed
//! document and the configured RPC provider/API key.
//!
//! There is no runtime chain CRUD. The registry is built once in
//! [`ChainRegistry::build`] and handed to every other component as a shared,
//! read-only reference — the same "load a params document once, fail fast if
//! it cannot be produced" shape this workspace's genesis bootstrap used to
//! use for seeding accounts, generalized here to seeding chains instead of
//! allocations.

pub mod seed;

pub use seed::{builtin_seeds, load_seed_file, ChainSeed};

use std::collections::HashMap;

use sentinel_core::{ChainId, SentinelError};
use tracing::info;

/// One watchable chain, with its RPC URL already resolved for the configured
/// provider.
#[derive(Clone, Debug)]
pub struct Chain {
    pub chain_id: ChainId,
    pub name: String,
    pub rpc_url: String,
    pub explorer_urls: Vec<String>,
    pub is_testnet: bool,
    pub is_active: bool,
    pub block_time_seconds: u64,
}

impl Chain {
    /// Builds an explorer transaction-detail link, or `None` if the chain
    /// has no configured explorer.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_urls
            .first()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

/// Immutable map of chain id to [`Chain`], built once at process start.
pub struct ChainRegistry {
    chains: HashMap<ChainId, Chain>,
}

impl ChainRegistry {
    /// Resolves every seed row's RPC template for `provider` and filters out
    /// testnets unless `include_testnets` is set. Fails fast if the result
    /// has no active chains at all, matching this workspace's convention
    /// that a process with nothing to do refuses to start rather than idle
    /// silently.
    pub fn build(
        seeds: Vec<ChainSeed>,
        provider: &str,
        api_key: &str,
        include_testnets: bool,
    ) -> Result<Self, SentinelError> {
        let mut chains = HashMap::new();

        for seed in seeds {
            if seed.is_testnet && !include_testnets {
                continue;
            }

            let template = match seed.rpc_url_templates.get(provider) {
                Some(t) => t,
                None => {
                    if seed.is_active {
                        return Err(SentinelError::MissingRpcUrl(
                            seed.chain_id,
                            provider.to_string(),
                        ));
                    }
                    continue;
                }
            };
            let rpc_url = template.replace("{api_key}", api_key);

            chains.insert(
                seed.chain_id,
                Chain {
                    chain_id: seed.chain_id,
                    name: seed.name,
                    rpc_url,
                    explorer_urls: seed.explorer_urls,
                    is_testnet: seed.is_testnet,
                    is_active: seed.is_active,
                    block_time_seconds: seed.block_time_seconds,
                },
            );
        }

        let registry = ChainRegistry { chains };
        if registry.list_active().is_empty() {
            return Err(SentinelError::NoActiveChains);
        }

        info!(
            chains = registry.chains.len(),
            active = registry.list_active().len(),
            provider,
            "chain registry built"
        );
        Ok(registry)
    }

    pub fn get(&self, chain_id: ChainId) -> Result<&Chain, SentinelError> {
        self.chains
            .get(&chain_id)
            .ok_or(SentinelError::UnknownChain(chain_id))
    }

    pub fn list_active(&self) -> Vec<&Chain> {
        let mut active: Vec<&Chain> = self.chains.values().filter(|c| c.is_active).collect();
        active.sort_by_key(|c| c.chain_id);
        active
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(chain_id: ChainId, is_testnet: bool, is_active: bool) -> ChainSeed {
        let mut templates = HashMap::new();
        templates.insert("alchemy".to_string(), format!("https://rpc/{{api_key}}/{chain_id}"));
        ChainSeed {
            chain_id,
            name: format!("chain-{chain_id}"),
            rpc_url_templates: templates,
            explorer_urls: vec!["https://explorer.example".to_string()],
            is_testnet,
            is_active,
            block_time_seconds: 12,
        }
    }

    #[test]
    fn builds_and_substitutes_api_key() {
        let registry = ChainRegistry::build(vec![seed(1, false, true)], "alchemy", "KEY123", false)
            .unwrap();
        let chain = registry.get(1).unwrap();
        assert_eq!(chain.rpc_url, "https://rpc/KEY123/1");
    }

    #[test]
    fn excludes_testnets_by_default() {
        let registry =
            ChainRegistry::build(vec![seed(1, false, true), seed(11155111, true, true)], "alchemy", "k", false)
                .unwrap();
        assert!(registry.get(11155111).is_err());
        assert_eq!(registry.list_active().len(), 1);
    }

    #[test]
    fn includes_testnets_when_requested() {
        let registry =
            ChainRegistry::build(vec![seed(1, false, true), seed(11155111, true, true)], "alchemy", "k", true)
                .unwrap();
        assert_eq!(registry.list_active().len(), 2);
    }

    #[test]
    fn fails_fast_with_no_active_chains() {
        let err = ChainRegistry::build(vec![seed(1, false, false)], "alchemy", "k", false).unwrap_err();
        assert!(matches!(err, SentinelError::NoActiveChains));
    }

    #[test]
    fn unknown_provider_on_active_chain_is_fatal() {
        let err = ChainRegistry::build(vec![seed(1, false, true)], "infura", "k", false).unwrap_err();
        assert!(matches!(err, SentinelError::MissingRpcUrl(1, _)));
    }

    #[test]
    fn builtin_seed_document_parses() {
        let seeds = builtin_seeds();
        assert!(!seeds.is_empty());
        assert!(seeds.iter().any(|s| s.chain_id == 1));
    }

    #[test]
    fn explorer_url_is_formatted() {
        let registry = ChainRegistry::build(vec![seed(1, false, true)], "alchemy", "k", false).unwrap();
        let chain = registry.get(1).unwrap();
        assert_eq!(
            chain.explorer_tx_url("0xdead").unwrap(),
            "https://explorer.example/tx/0xdead"
        );
    }
}
