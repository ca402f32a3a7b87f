use std::sync::Arc;

use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, Tokio1Executor};
use tokio::sync::{mpsc, watch};

use sentinel_chain::ChainRegistry;
use sentinel_core::SentinelError;
use sentinel_flow::StatusChanged;
use sentinel_registry::ContractRegistry;
use sentinel_store::{NotificationConfig, NotificationLogEntry, NotificationPayload, SendStatus, StoreDb, WatchedContract};

use crate::channels::{ChannelAdapter, EmailChannel, LarkChannel, TelegramChannel};
use crate::rendering::{self, RenderedMessage};

/// Dispatcher-wide settings shared across every send: the SMTP transport
/// and sender identity (one mailbox for the whole deployment), and the HTTP
/// client already used by the RPC layer.
pub struct DispatcherConfig {
    pub smtp_transport: AsyncSmtpTransport<Tokio1Executor>,
    pub smtp_from: Mailbox,
    pub http: reqwest::Client,
}

/// The notification dispatcher (C10): fans `StatusChanged` events out to
/// every interested recipient's active channel configs, with an
/// at-most-once guarantee enforced by the store's dedup log.
pub struct Dispatcher {
    store: Arc<StoreDb>,
    registry: Arc<ContractRegistry>,
    chains: Arc<ChainRegistry>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<StoreDb>,
        registry: Arc<ContractRegistry>,
        chains: Arc<ChainRegistry>,
        config: DispatcherConfig,
    ) -> Self {
        Dispatcher { store, registry, chains, config }
    }

    /// Drains `receiver` until it closes or shutdown is signalled, finishing
    /// whichever event it's currently sending before stopping — queued
    /// events beyond that are dropped, per the lifecycle's shutdown rule.
    pub async fn run(&self, mut receiver: mpsc::Receiver<StatusChanged>, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                change = receiver.recv() => {
                    match change {
                        Some(change) => {
                            if let Err(err) = self.dispatch(change).await {
                                tracing::warn!(error = %err, "notification dispatch failed");
                            }
                        }
                        None => break,
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("notification dispatcher shutting down, dropping queued events");
                        break;
                    }
                }
            }
        }
    }

    pub async fn dispatch(&self, change: StatusChanged) -> Result<(), SentinelError> {
        let flow_ref = change.flow_ref;
        let Some(contract) = self
            .registry
            .lookup(flow_ref.standard, flow_ref.chain_id, flow_ref.contract_address)
            .await?
        else {
            tracing::warn!(?flow_ref, "status change for an unregistered contract, skipping notification");
            return Ok(());
        };
        let Ok(chain) = self.chains.get(flow_ref.chain_id) else {
            tracing::warn!(chain_id = flow_ref.chain_id, "status change for an unknown chain, skipping notification");
            return Ok(());
        };

        let rendered = rendering::render(chain, &contract, &change);

        for recipient in contract.recipient_addresses() {
            let configs = self.store.configs_for_recipient(recipient)?;
            for config in configs.into_iter().filter(|c| c.active) {
                self.send_one(&contract, &change, &rendered, &config).await?;
            }
        }
        Ok(())
    }

    async fn send_one(
        &self,
        contract: &WatchedContract,
        change: &StatusChanged,
        rendered: &RenderedMessage,
        config: &NotificationConfig,
    ) -> Result<(), SentinelError> {
        let channel_name = config.channel.as_str();
        let already_sent = self.store.notification_already_sent(
            channel_name,
            &config.config_id,
            change.flow_ref.flow_id,
            change.to,
        )?;
        if already_sent {
            return Ok(());
        }

        let adapter = match self.build_adapter(config) {
            Ok(adapter) => adapter,
            Err(err) => {
                self.record(contract, change, config, SendStatus::Failed, Some(err.to_string()))?;
                return Ok(());
            }
        };

        // A panicking adapter must not take the dispatcher's loop down with
        // it — isolate each send in its own task so a panic surfaces as a
        // `JoinError` we can record as a failed send instead of an unwind.
        let rendered = rendered.clone();
        let config_id = config.config_id.clone();
        let (send_status, error_message) = match tokio::spawn(async move { adapter.send(&rendered).await }).await {
            Ok(Ok(())) => (SendStatus::Success, None),
            Ok(Err(err)) => {
                tracing::warn!(config_id = %config_id, error = %err, "channel send failed");
                (SendStatus::Failed, Some(err.to_string()))
            }
            Err(join_err) => {
                tracing::warn!(config_id = %config_id, error = %join_err, "channel adapter panicked");
                (SendStatus::Failed, Some(format!("adapter panicked: {join_err}")))
            }
        };
        self.record(contract, change, config, send_status, error_message)
    }

    fn build_adapter(&self, config: &NotificationConfig) -> Result<Box<dyn ChannelAdapter>, SentinelError> {
        Ok(match &config.payload {
            NotificationPayload::Email { address } => {
                let to: Mailbox = address
                    .parse()
                    .map_err(|e| SentinelError::Other(anyhow::anyhow!("invalid email address {address}: {e}")))?;
                Box::new(EmailChannel::new(self.config.smtp_transport.clone(), self.config.smtp_from.clone(), to))
            }
            NotificationPayload::Telegram { bot_token, chat_id } => {
                Box::new(TelegramChannel::new(self.config.http.clone(), bot_token.clone(), chat_id.clone()))
            }
            NotificationPayload::Webhook { webhook_url, secret } => {
                Box::new(LarkChannel::new(self.config.http.clone(), webhook_url.clone(), secret.clone()))
            }
        })
    }

    fn record(
        &self,
        contract: &WatchedContract,
        change: &StatusChanged,
        config: &NotificationConfig,
        send_status: SendStatus,
        error_message: Option<String>,
    ) -> Result<(), SentinelError> {
        self.store.record_notification(&NotificationLogEntry {
            channel: config.channel.as_str().to_string(),
            config_id: config.config_id.clone(),
            flow_id: change.flow_ref.flow_id,
            standard: contract.standard,
            chain_id: contract.chain_id,
            contract_address: contract.contract_address,
            status_from: change.from,
            status_to: change.to,
            tx_hash: change.tx_hash,
            send_status,
            error_message,
            sent_at: chrono::Utc::now().timestamp(),
        })?;
        Ok(())
    }
}
