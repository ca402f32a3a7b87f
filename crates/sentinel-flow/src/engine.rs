use std::sync::Arc;

use sentinel_core::{SentinelError, TimelockStandard, TxStatus};
use sentinel_decode::DecodedEvent;
use sentinel_registry::ContractRegistry;
use sentinel_store::{EventRow, StoreDb};

use crate::status::{FlowRef, StatusChanged};
use crate::transitions::{CompoundEngine, OpenZeppelinEngine, StandardEngine};

fn decoded_event_of(event: &EventRow) -> Option<DecodedEvent> {
    serde_json::from_value(event.raw_args.clone()).ok()
}

fn flow_id_of(decoded: &DecodedEvent) -> Option<sentinel_core::Hash32> {
    match decoded {
        DecodedEvent::Compound(e) => e.flow_id(),
        DecodedEvent::OpenZeppelin(e) => e.flow_id(),
    }
}

/// Turns a batch of newly-inserted events into flow upserts and the
/// `StatusChanged` transitions they cause (C8). A pure function of "event
/// batch + current flow state"; the only side effects are the store writes
/// it performs along the way.
pub struct FlowEngine {
    store: Arc<StoreDb>,
    registry: Arc<ContractRegistry>,
    compound: CompoundEngine,
    openzeppelin: OpenZeppelinEngine,
}

impl FlowEngine {
    pub fn new(store: Arc<StoreDb>, registry: Arc<ContractRegistry>) -> Self {
        FlowEngine { store, registry, compound: CompoundEngine, openzeppelin: OpenZeppelinEngine }
    }

    /// Applies `events`, which callers must supply in `(block_number,
    /// log_index)` order within a chain. Events whose transaction reverted,
    /// or that don't carry a flow id (admin/role-change events), are stored
    /// already but have no further effect here.
    pub async fn process_batch(&self, events: &[EventRow]) -> Result<Vec<StatusChanged>, SentinelError> {
        let mut changes = Vec::new();
        for event in events {
            if event.tx_status != TxStatus::Success {
                continue;
            }
            let Some(decoded) = decoded_event_of(event) else { continue };
            let Some(flow_id) = flow_id_of(&decoded) else { continue };

            let Some(contract) = self
                .registry
                .lookup(event.standard, event.chain_id, event.contract_address)
                .await?
            else {
                tracing::warn!(
                    chain_id = event.chain_id,
                    contract = %event.contract_address,
                    "event for an unregistered contract, skipping flow update"
                );
                continue;
            };

            let existing =
                self.store.get_flow(event.standard, event.chain_id, event.contract_address, flow_id)?;
            let prior_status = existing.as_ref().map(|f| f.status);

            let engine: &dyn StandardEngine = match event.standard {
                TimelockStandard::Compound => &self.compound,
                TimelockStandard::OpenZeppelin => &self.openzeppelin,
            };
            let Some(new_flow) = engine.apply(&contract, event, &decoded, existing) else { continue };
            let new_status = new_flow.status;
            self.store.upsert_flow(&new_flow)?;

            if let Some(prior) = prior_status {
                if prior != new_status {
                    changes.push(StatusChanged {
                        flow_ref: FlowRef {
                            standard: event.standard,
                            chain_id: event.chain_id,
                            contract_address: event.contract_address,
                            flow_id,
                        },
                        from: prior,
                        to: new_status,
                        tx_hash: Some(event.tx_hash),
                    });
                }
            }
        }
        Ok(changes)
    }
}
