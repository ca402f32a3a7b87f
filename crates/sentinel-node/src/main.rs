mod cli;
mod config;

use std::sync::Arc;

use clap::Parser;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, Tokio1Executor};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sentinel_chain::{builtin_seeds, load_seed_file, ChainRegistry};
use sentinel_core::{
    SentinelError, DEFAULT_NOTIFY_QUEUE_CAPACITY, DEFAULT_REGISTRY_REFRESH_INTERVAL_SECS,
    DEFAULT_SHUTDOWN_GRACE_SECS,
};
use sentinel_flow::FlowEngine;
use sentinel_notify::{Dispatcher, DispatcherConfig};
use sentinel_registry::ContractRegistry;
use sentinel_rpc::{EvmRpcClient, RetryPolicy};
use sentinel_scan::{ChainWorker, ScanConfig};
use sentinel_store::StoreDb;

use crate::cli::CliArgs;
use crate::config::Config;

fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn build_smtp_transport(config: &Config) -> Result<AsyncSmtpTransport<Tokio1Executor>, SentinelError> {
    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        .map_err(|e| SentinelError::Config(format!("invalid smtp host {:?}: {e}", config.smtp_host)))?
        .port(config.smtp_port);
    if !config.smtp_username.is_empty() {
        builder = builder.credentials(Credentials::new(config.smtp_username.clone(), config.smtp_password.clone()));
    }
    Ok(builder.build())
}

/// Startup sequence:
///   1. Resolve config (defaults -> file -> env -> CLI) and init tracing
///   2. Build the chain registry from the seed document
///   3. Open the store and build the shared registry/flow-engine/dispatcher
///   4. Spawn one scan worker per active chain, the flow refresher, and the
///      notification dispatcher, all sharing one shutdown signal
///   5. On Ctrl-C, signal shutdown and drain in-flight work with a grace
///      period before exiting
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = Config::load(&cli)?;
    init_tracing(&config.log_filter);

    info!("starting sentinel-node");

    let seeds = match &config.chains_file {
        Some(path) => load_seed_file(path)?,
        None => builtin_seeds(),
    };
    let api_key = if config.rpc_provider == "infura" { &config.infura_api_key } else { &config.alchemy_api_key };
    let chains = Arc::new(ChainRegistry::build(seeds, &config.rpc_provider, api_key, config.include_testnets)?);

    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| SentinelError::Config(format!("creating data dir {:?}: {e}", config.data_dir)))?;
    let store = Arc::new(StoreDb::open(&config.data_dir)?);
    let registry = Arc::new(ContractRegistry::new(
        store.clone(),
        std::time::Duration::from_secs(DEFAULT_REGISTRY_REFRESH_INTERVAL_SECS),
    ));
    let flow_engine = Arc::new(FlowEngine::new(store.clone(), registry.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (status_tx, status_rx) = mpsc::channel(DEFAULT_NOTIFY_QUEUE_CAPACITY);

    let retry = RetryPolicy::default();
    let scan_config = ScanConfig {
        confirmations: config.scan_confirmations,
        batch_size: config.scan_batch_size,
        interval: config.scan_interval,
        interval_slow: config.scan_interval_slow,
    };

    let mut scan_handles = Vec::new();
    for chain in chains.list_active() {
        let client = EvmRpcClient::new(chain.chain_id, chain.rpc_url.clone(), config.rpc_timeout, retry);
        let worker = ChainWorker::new(
            chain.chain_id,
            client,
            store.clone(),
            registry.clone(),
            flow_engine.clone(),
            status_tx.clone(),
            scan_config,
        );
        let shutdown_rx = shutdown_rx.clone();
        scan_handles.push(tokio::spawn(async move {
            worker.run(shutdown_rx).await;
        }));
    }
    info!(chains = scan_handles.len(), "scan workers started");

    let refresher_store = store.clone();
    let refresher_sender = status_tx.clone();
    let refresher_shutdown = shutdown_rx.clone();
    let refresh_interval = config.flow_refresh_interval;
    let refresh_batch_size = config.flow_refresh_batch_size;
    let refresher_handle = tokio::spawn(async move {
        sentinel_flow::run_refresher(refresher_store, refresh_interval, refresh_batch_size, refresher_sender, refresher_shutdown)
            .await;
    });

    // The workers and refresher each hold their own clone; dropping the
    // binary's own sender lets the dispatcher's channel close once every
    // producer has stopped, ending its `run` loop cleanly.
    drop(status_tx);

    let smtp_transport = build_smtp_transport(&config)?;
    let smtp_from: Mailbox = config
        .smtp_from
        .parse()
        .map_err(|e| SentinelError::Config(format!("invalid smtp_from {:?}: {e}", config.smtp_from)))?;
    let dispatcher = Dispatcher::new(
        store.clone(),
        registry.clone(),
        chains.clone(),
        DispatcherConfig { smtp_transport, smtp_from, http: reqwest::Client::new() },
    );
    let dispatcher_shutdown = shutdown_rx.clone();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(status_rx, dispatcher_shutdown).await;
    });

    tokio::signal::ctrl_c().await.ok();
    info!("shutdown requested, draining in-flight work");
    let _ = shutdown_tx.send(true);

    let grace = std::time::Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS);
    if tokio::time::timeout(grace, futures::future::join_all(scan_handles)).await.is_err() {
        warn!("scan workers did not stop within the shutdown grace period");
    }
    if let Err(err) = refresher_handle.await {
        error!(error = %err, "flow refresher task panicked");
    }
    if let Err(err) = dispatcher_handle.await {
        error!(error = %err, "notification dispatcher task panicked");
    }

    store.flush()?;
    info!("sentinel-node stopped");
    Ok(())
}
