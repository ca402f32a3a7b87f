//! Layered configuration (§6 of the design notes): built-in defaults, an
//! optional TOML file, environment variables (`SENTINEL_<SECTION>_<KEY>`),
//! then CLI flags — each layer overriding only the keys it actually sets.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use sentinel_core::{
    SentinelError, DEFAULT_FLOW_REFRESH_BATCH_SIZE, DEFAULT_FLOW_REFRESH_INTERVAL_SECS,
    DEFAULT_NOTIFY_QUEUE_CAPACITY, DEFAULT_RPC_RETRY_DELAY_MS, DEFAULT_RPC_RETRY_MAX,
    DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_SCAN_BATCH_SIZE, DEFAULT_SCAN_CONFIRMATIONS,
    DEFAULT_SCAN_INTERVAL_SECS, DEFAULT_SCAN_INTERVAL_SLOW_SECS,
};

use crate::cli::CliArgs;

/// One flat, fully-resolved configuration object. Every field has a
/// built-in default; [`Config::load`] applies the file, then environment,
/// then CLI layers on top, later layers winning.
#[derive(Clone, Debug)]
pub struct Config {
    pub rpc_provider: String,
    pub alchemy_api_key: String,
    pub infura_api_key: String,
    pub include_testnets: bool,
    pub rpc_timeout: Duration,
    pub rpc_retry_max: u32,
    pub rpc_retry_delay_ms: u64,
    pub scan_batch_size: u64,
    pub scan_interval: Duration,
    pub scan_interval_slow: Duration,
    pub scan_confirmations: u64,
    pub flow_refresh_interval: Duration,
    pub flow_refresh_batch_size: usize,
    pub data_dir: PathBuf,
    pub chains_file: Option<PathBuf>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from: String,
    pub notify_queue_capacity: usize,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rpc_provider: "alchemy".to_string(),
            alchemy_api_key: String::new(),
            infura_api_key: String::new(),
            include_testnets: false,
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            rpc_retry_max: DEFAULT_RPC_RETRY_MAX,
            rpc_retry_delay_ms: DEFAULT_RPC_RETRY_DELAY_MS,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
            scan_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
            scan_interval_slow: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SLOW_SECS),
            scan_confirmations: DEFAULT_SCAN_CONFIRMATIONS,
            flow_refresh_interval: Duration::from_secs(DEFAULT_FLOW_REFRESH_INTERVAL_SECS),
            flow_refresh_batch_size: DEFAULT_FLOW_REFRESH_BATCH_SIZE,
            data_dir: PathBuf::from("./data"),
            chains_file: None,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: String::new(),
            notify_queue_capacity: DEFAULT_NOTIFY_QUEUE_CAPACITY,
            log_filter: "info,sentinel=debug".to_string(),
        }
    }
}

impl Config {
    /// Assembles the config in the mandated order: defaults → file → env →
    /// CLI flags. Fails fast if a config file is given but unreadable or
    /// malformed — a broken config is treated the same as a missing one
    /// that the operator explicitly asked for.
    pub fn load(cli: &CliArgs) -> Result<Self, SentinelError> {
        let mut config = Config::default();

        if let Some(path) = &cli.config_file {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| SentinelError::Config(format!("reading config file {path:?}: {e}")))?;
            let file: FileConfig = toml::from_str(&raw)
                .map_err(|e| SentinelError::Config(format!("parsing config file {path:?}: {e}")))?;
            config.apply_file(file);
        }

        config.apply_env();
        config.apply_cli(cli);
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(rpc) = file.rpc {
            if let Some(v) = rpc.provider { self.rpc_provider = v; }
            if let Some(v) = rpc.alchemy_api_key { self.alchemy_api_key = v; }
            if let Some(v) = rpc.infura_api_key { self.infura_api_key = v; }
            if let Some(v) = rpc.include_testnets { self.include_testnets = v; }
        }
        if let Some(scanner) = file.scanner {
            if let Some(v) = scanner.rpc_timeout { self.rpc_timeout = Duration::from_secs(v); }
            if let Some(v) = scanner.rpc_retry_max { self.rpc_retry_max = v; }
            if let Some(v) = scanner.rpc_retry_delay { self.rpc_retry_delay_ms = v; }
            if let Some(v) = scanner.scan_batch_size { self.scan_batch_size = v; }
            if let Some(v) = scanner.scan_interval { self.scan_interval = Duration::from_secs(v); }
            if let Some(v) = scanner.scan_interval_slow { self.scan_interval_slow = Duration::from_secs(v); }
            if let Some(v) = scanner.scan_confirmations { self.scan_confirmations = v; }
            if let Some(v) = scanner.flow_refresh_interval { self.flow_refresh_interval = Duration::from_secs(v); }
            if let Some(v) = scanner.flow_refresh_batch_size { self.flow_refresh_batch_size = v; }
        }
        if let Some(store) = file.store {
            if let Some(v) = store.data_dir { self.data_dir = v; }
            if let Some(v) = store.chains_file { self.chains_file = Some(v); }
        }
        if let Some(notify) = file.notify {
            if let Some(v) = notify.smtp_host { self.smtp_host = v; }
            if let Some(v) = notify.smtp_port { self.smtp_port = v; }
            if let Some(v) = notify.smtp_username { self.smtp_username = v; }
            if let Some(v) = notify.smtp_password { self.smtp_password = v; }
            if let Some(v) = notify.smtp_from { self.smtp_from = v; }
            if let Some(v) = notify.send_queue_capacity { self.notify_queue_capacity = v; }
        }
        if let Some(log) = file.log {
            if let Some(v) = log.filter { self.log_filter = v; }
        }
    }

    fn apply_env(&mut self) {
        env_string("SENTINEL_RPC_PROVIDER", &mut self.rpc_provider);
        env_string("SENTINEL_RPC_ALCHEMY_API_KEY", &mut self.alchemy_api_key);
        env_string("SENTINEL_RPC_INFURA_API_KEY", &mut self.infura_api_key);
        env_parsed("SENTINEL_RPC_INCLUDE_TESTNETS", &mut self.include_testnets);

        env_parsed_secs("SENTINEL_SCANNER_RPC_TIMEOUT", &mut self.rpc_timeout);
        env_parsed("SENTINEL_SCANNER_RPC_RETRY_MAX", &mut self.rpc_retry_max);
        env_parsed("SENTINEL_SCANNER_RPC_RETRY_DELAY", &mut self.rpc_retry_delay_ms);
        env_parsed("SENTINEL_SCANNER_SCAN_BATCH_SIZE", &mut self.scan_batch_size);
        env_parsed_secs("SENTINEL_SCANNER_SCAN_INTERVAL", &mut self.scan_interval);
        env_parsed_secs("SENTINEL_SCANNER_SCAN_INTERVAL_SLOW", &mut self.scan_interval_slow);
        env_parsed("SENTINEL_SCANNER_SCAN_CONFIRMATIONS", &mut self.scan_confirmations);
        env_parsed_secs("SENTINEL_SCANNER_FLOW_REFRESH_INTERVAL", &mut self.flow_refresh_interval);
        env_parsed("SENTINEL_SCANNER_FLOW_REFRESH_BATCH_SIZE", &mut self.flow_refresh_batch_size);

        env_path("SENTINEL_STORE_DATA_DIR", &mut self.data_dir);
        if let Ok(v) = std::env::var("SENTINEL_STORE_CHAINS_FILE") {
            self.chains_file = Some(PathBuf::from(v));
        }

        env_string("SENTINEL_NOTIFY_SMTP_HOST", &mut self.smtp_host);
        env_parsed("SENTINEL_NOTIFY_SMTP_PORT", &mut self.smtp_port);
        env_string("SENTINEL_NOTIFY_SMTP_USERNAME", &mut self.smtp_username);
        env_string("SENTINEL_NOTIFY_SMTP_PASSWORD", &mut self.smtp_password);
        env_string("SENTINEL_NOTIFY_SMTP_FROM", &mut self.smtp_from);
        env_parsed("SENTINEL_NOTIFY_SEND_QUEUE_CAPACITY", &mut self.notify_queue_capacity);

        if let Ok(v) = std::env::var("RUST_LOG") {
            self.log_filter = v;
        }
        env_string("SENTINEL_LOG_FILTER", &mut self.log_filter);
    }

    fn apply_cli(&mut self, cli: &CliArgs) {
        if let Some(v) = &cli.rpc_provider { self.rpc_provider = v.clone(); }
        if let Some(v) = &cli.alchemy_api_key { self.alchemy_api_key = v.clone(); }
        if let Some(v) = &cli.infura_api_key { self.infura_api_key = v.clone(); }
        if cli.include_testnets { self.include_testnets = true; }
        if let Some(v) = &cli.data_dir { self.data_dir = v.clone(); }
        if let Some(v) = &cli.chains_file { self.chains_file = Some(v.clone()); }
        if let Some(v) = &cli.log_filter { self.log_filter = v.clone(); }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    rpc: Option<RpcFile>,
    scanner: Option<ScannerFile>,
    store: Option<StoreFile>,
    notify: Option<NotifyFile>,
    log: Option<LogFile>,
}

#[derive(Debug, Default, Deserialize)]
struct RpcFile {
    provider: Option<String>,
    alchemy_api_key: Option<String>,
    infura_api_key: Option<String>,
    include_testnets: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ScannerFile {
    rpc_timeout: Option<u64>,
    rpc_retry_max: Option<u32>,
    rpc_retry_delay: Option<u64>,
    scan_batch_size: Option<u64>,
    scan_interval: Option<u64>,
    scan_interval_slow: Option<u64>,
    scan_confirmations: Option<u64>,
    flow_refresh_interval: Option<u64>,
    flow_refresh_batch_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct StoreFile {
    data_dir: Option<PathBuf>,
    chains_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct NotifyFile {
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
    smtp_from: Option<String>,
    send_queue_capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LogFile {
    filter: Option<String>,
}

fn env_string(key: &str, target: &mut String) {
    if let Ok(v) = std::env::var(key) {
        *target = v;
    }
}

fn env_path(key: &str, target: &mut PathBuf) {
    if let Ok(v) = std::env::var(key) {
        *target = PathBuf::from(v);
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(v) = std::env::var(key) {
        if let Ok(parsed) = v.parse() {
            *target = parsed;
        }
    }
}

fn env_parsed_secs(key: &str, target: &mut Duration) {
    if let Ok(v) = std::env::var(key) {
        if let Ok(secs) = v.parse::<u64>() {
            *target = Duration::from_secs(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layer_overrides_defaults() {
        let mut config = Config::default();
        let file: FileConfig = toml::from_str(
            r#"
            [rpc]
            provider = "infura"
            infura_api_key = "abc123"

            [scanner]
            scan_batch_size = 500
            "#,
        )
        .unwrap();
        config.apply_file(file);
        assert_eq!(config.rpc_provider, "infura");
        assert_eq!(config.infura_api_key, "abc123");
        assert_eq!(config.scan_batch_size, 500);
        assert_eq!(config.scan_confirmations, DEFAULT_SCAN_CONFIRMATIONS);
    }
}
