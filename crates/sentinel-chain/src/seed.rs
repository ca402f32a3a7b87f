use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sentinel_core::{ChainId, SentinelError};

/// One row of the chain seed document: everything the registry needs to know
/// about a chain before any RPC call is made.
///
/// `rpc_url_templates` maps a provider name (`"alchemy"`, `"infura"`) to a
/// URL template containing the literal placeholder `{api_key}`. Only the
/// provider selected by `rpc.provider` in the node config is ever
/// substituted; a chain that lacks a template for the configured provider is
/// simply not watchable and is reported via [`SentinelError::MissingRpcUrl`]
/// if it is also marked active.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSeed {
    pub chain_id: ChainId,
    pub name: String,
    pub rpc_url_templates: HashMap<String, String>,
    pub explorer_urls: Vec<String>,
    #[serde(default)]
    pub is_testnet: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub block_time_seconds: u64,
}

fn default_true() -> bool {
    true
}

/// Loads the chain seed document from disk. This is the one and only place
/// chains are defined — there is no runtime chain CRUD; adding a chain is a
/// redeploy with an updated seed file.
pub fn load_seed_file(path: &Path) -> Result<Vec<ChainSeed>, SentinelError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SentinelError::Config(format!("reading chain seed file {path:?}: {e}")))?;
    serde_json::from_str(&raw)
        .map_err(|e| SentinelError::Config(format!("parsing chain seed file {path:?}: {e}")))
}

/// The built-in seed set shipped with the binary, used when no `--chains`
/// file is supplied. Covers the chains the two reference timelock standards
/// are most commonly deployed on.
pub fn builtin_seeds() -> Vec<ChainSeed> {
    serde_json::from_str(include_str!("../config/chains.json"))
        .expect("builtin chain seed document must parse")
}
