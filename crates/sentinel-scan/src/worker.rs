use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use sentinel_core::{
    Address, ChainId, Hash32, SentinelError, TimelockStandard, TxStatus,
    DEFAULT_SCAN_BATCH_SIZE, DEFAULT_SCAN_CONFIRMATIONS, DEFAULT_SCAN_INTERVAL_SECS,
    DEFAULT_SCAN_INTERVAL_SLOW_SECS,
};
use sentinel_decode::{abi, decode_log};
use sentinel_flow::{FlowEngine, StatusChanged};
use sentinel_registry::{ChainContracts, ContractRegistry};
use sentinel_rpc::{BlockHeader, EvmRpcClient, RawLog, TxReceipt};
use sentinel_store::{EventRow, StoreDb};

/// Tunables for one chain's worker. Defaults mirror the constants a fresh
/// deployment runs with; `sentinel-node`'s config layer overrides them per
/// chain when the operator asks for a tighter or looser confirmation depth.
#[derive(Clone, Copy, Debug)]
pub struct ScanConfig {
    pub confirmations: u64,
    pub batch_size: u64,
    pub interval: Duration,
    pub interval_slow: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            confirmations: DEFAULT_SCAN_CONFIRMATIONS,
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
            interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
            interval_slow: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SLOW_SECS),
        }
    }
}

/// One chain's scan loop. Owns that chain's progress cursor exclusively —
/// no other task ever calls `advance_progress` for the same `chain_id`.
pub struct ChainWorker {
    chain_id: ChainId,
    client: EvmRpcClient,
    store: Arc<StoreDb>,
    registry: Arc<ContractRegistry>,
    flow_engine: Arc<FlowEngine>,
    sender: mpsc::Sender<StatusChanged>,
    config: ScanConfig,
}

impl ChainWorker {
    pub fn new(
        chain_id: ChainId,
        client: EvmRpcClient,
        store: Arc<StoreDb>,
        registry: Arc<ContractRegistry>,
        flow_engine: Arc<FlowEngine>,
        sender: mpsc::Sender<StatusChanged>,
        config: ScanConfig,
    ) -> Self {
        ChainWorker { chain_id, client, store, registry, flow_engine, sender, config }
    }

    /// Ticks until `shutdown` reports true. A tick failure never stops the
    /// loop — it backs off for `config.interval` and retries the same
    /// window, since progress only ever advances after a tick commits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let sleep_for = match self.tick().await {
                Ok(duration) => duration,
                Err(err) => {
                    warn!(chain_id = self.chain_id, error = %err, "scan tick failed, retrying same window");
                    self.config.interval
                }
            };
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(chain_id = self.chain_id, "scan worker stopped");
    }

    /// One pass of the scheduler's tick algorithm. Returns how long to
    /// sleep before the next tick.
    async fn tick(&self) -> Result<Duration, SentinelError> {
        let head = self.client.head_block().await?;
        let safe_head = head.saturating_sub(self.config.confirmations);

        let last_scanned = match self.store.get_progress(self.chain_id)? {
            Some(block) => block,
            None => {
                // First run for this chain: start watching from the
                // current safe head rather than replaying full history —
                // this is a real-time monitor, not a chain indexer.
                self.store.advance_progress(self.chain_id, safe_head)?;
                info!(chain_id = self.chain_id, safe_head, "initialized scan progress at current safe head");
                return Ok(self.config.interval_slow);
            }
        };

        if safe_head <= last_scanned {
            return Ok(self.config.interval_slow);
        }

        let from = last_scanned + 1;
        let to = safe_head.min(from + self.config.batch_size - 1);

        let contracts = self.registry.list_active_by_chain(self.chain_id).await?;
        if contracts.is_empty() {
            self.store.advance_progress(self.chain_id, to)?;
            return Ok(self.next_interval(to, safe_head));
        }

        let (mut inserted, committed_to) = self.scan_committing(&contracts, from, to).await?;
        inserted.sort_by_key(|row| (row.block_number, row.log_index));

        let changes = self.flow_engine.process_batch(&inserted).await?;
        for change in changes {
            if self.sender.send(change).await.is_err() {
                warn!(chain_id = self.chain_id, "status-change channel closed, dropping remaining transitions");
                break;
            }
        }

        self.store.advance_progress(self.chain_id, committed_to)?;
        debug!(
            chain_id = self.chain_id,
            from,
            to = committed_to,
            events = inserted.len(),
            "scan tick committed"
        );
        Ok(self.next_interval(committed_to, safe_head))
    }

    fn next_interval(&self, committed_to: u64, safe_head: u64) -> Duration {
        if committed_to < safe_head {
            self.config.interval
        } else {
            self.config.interval_slow
        }
    }

    /// Scans `[from, to]`, halving the range once on failure and falling
    /// back to skipping a single unreadable block (a "poison pill") if the
    /// halved range still fails. Returns the events found and the block
    /// number progress is safe to advance to — which may be short of `to`
    /// when a failure narrowed the committed range; the next tick picks up
    /// the remainder.
    async fn scan_committing(
        &self,
        contracts: &ChainContracts,
        from: u64,
        to: u64,
    ) -> Result<(Vec<EventRow>, u64), SentinelError> {
        match self.scan_range(contracts, from, to).await {
            Ok(rows) => return Ok((rows, to)),
            Err(err) if to == from => {
                warn!(chain_id = self.chain_id, block = from, error = %err, "skipping unreadable block (poison pill)");
                return Ok((Vec::new(), from));
            }
            Err(err) => {
                warn!(chain_id = self.chain_id, from, to, error = %err, "range scan failed, halving batch once and retrying");
            }
        }

        let mid = from + (to - from) / 2;
        match self.scan_range(contracts, from, mid).await {
            Ok(rows) => Ok((rows, mid)),
            Err(err) => {
                warn!(chain_id = self.chain_id, from, mid, error = %err, "halved range still failing, skipping one block (poison pill)");
                Ok((Vec::new(), from))
            }
        }
    }

    async fn scan_range(
        &self,
        contracts: &ChainContracts,
        from: u64,
        to: u64,
    ) -> Result<Vec<EventRow>, SentinelError> {
        let mut rows = Vec::new();
        if !contracts.compound.is_empty() {
            let addresses: Vec<Address> =
                contracts.compound.iter().map(|c| c.contract_address).collect();
            let topics = abi::COMPOUND.all_topics();
            let logs = self.client.get_logs(from, to, &addresses, Some(&topics)).await?;
            self.ingest_logs(TimelockStandard::Compound, logs, &mut rows).await?;
        }
        if !contracts.openzeppelin.is_empty() {
            let addresses: Vec<Address> =
                contracts.openzeppelin.iter().map(|c| c.contract_address).collect();
            let topics = abi::OPENZEPPELIN.all_topics();
            let logs = self.client.get_logs(from, to, &addresses, Some(&topics)).await?;
            self.ingest_logs(TimelockStandard::OpenZeppelin, logs, &mut rows).await?;
        }
        Ok(rows)
    }

    /// Decodes and stores each log, caching the one receipt/block lookup per
    /// unique transaction/block seen within this call — a tick's logs
    /// usually cluster into far fewer transactions and blocks than logs.
    async fn ingest_logs(
        &self,
        standard: TimelockStandard,
        logs: Vec<RawLog>,
        rows: &mut Vec<EventRow>,
    ) -> Result<(), SentinelError> {
        let mut receipts: HashMap<Hash32, TxReceipt> = HashMap::new();
        let mut blocks: HashMap<u64, BlockHeader> = HashMap::new();

        for log in logs {
            let Some(decoded) = decode_log(standard, &log)? else {
                continue;
            };

            if !receipts.contains_key(&log.tx_hash) {
                let receipt = self.client.get_receipt(log.tx_hash).await?;
                receipts.insert(log.tx_hash, receipt);
            }
            if !blocks.contains_key(&log.block_number) {
                let block = self.client.get_block(log.block_number).await?;
                blocks.insert(log.block_number, block);
            }
            let receipt = &receipts[&log.tx_hash];
            let block = &blocks[&log.block_number];

            let raw_args = serde_json::to_value(&decoded)
                .map_err(|e| SentinelError::Serialization(e.to_string()))?;

            let row = EventRow {
                standard,
                chain_id: self.chain_id,
                contract_address: log.address,
                block_number: log.block_number,
                block_hash: log.block_hash,
                block_timestamp: block.timestamp,
                tx_hash: log.tx_hash,
                tx_index: log.tx_index,
                log_index: log.log_index,
                from_address: Some(receipt.from),
                to_address: Some(log.address),
                event_type: decoded.event_type().to_string(),
                tx_status: if receipt.status_success { TxStatus::Success } else { TxStatus::Failed },
                raw_args,
            };

            if self.store.insert_event_if_absent(&row)? {
                rows.push(row);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_prefers_fast_interval_when_behind() {
        let config = ScanConfig::default();
        assert!(config.interval < config.interval_slow);
    }
}
