//! Command-line surface. Every field is optional so the config layering in
//! [`crate::config`] can tell "not passed" apart from "passed, matches the
//! default" — only flags the operator actually typed override lower layers.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sentinel-node", about = "Multi-chain timelock operations center")]
pub struct CliArgs {
    /// Path to an optional TOML config file.
    #[arg(long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// RPC provider to build endpoint URLs for ("alchemy" or "infura").
    #[arg(long)]
    pub rpc_provider: Option<String>,

    #[arg(long)]
    pub alchemy_api_key: Option<String>,

    #[arg(long)]
    pub infura_api_key: Option<String>,

    /// Include testnet chains from the built-in chain seed list.
    #[arg(long, default_value_t = false)]
    pub include_testnets: bool,

    /// Directory the embedded store keeps its data in.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Path to a chain-seed override file (same shape as the built-in list).
    #[arg(long, value_name = "PATH")]
    pub chains_file: Option<PathBuf>,

    /// tracing-subscriber `EnvFilter` string, e.g. "info,sentinel_scan=debug".
    #[arg(long)]
    pub log_filter: Option<String>,
}
