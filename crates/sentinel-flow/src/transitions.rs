use sentinel_core::{Address, ChainId, FlowStatus, Hash32, TimelockStandard, Timestamp};
use sentinel_decode::{CompoundEvent, DecodedEvent, OpenZeppelinEvent};
use sentinel_store::{EventRow, Flow, WatchedContract};

/// How one timelock standard's decoded events map onto flow transitions.
/// Dispatched by the `standard` tag carried on every event/flow row, not by
/// an inheritance hierarchy or scattered `if standard == ...` checks.
pub trait StandardEngine {
    fn apply(
        &self,
        contract: &WatchedContract,
        event: &EventRow,
        decoded: &DecodedEvent,
        existing: Option<Flow>,
    ) -> Option<Flow>;
}

#[allow(clippy::too_many_arguments)]
fn apply_queue(
    existing: Option<Flow>,
    standard: TimelockStandard,
    chain_id: ChainId,
    contract_address: Address,
    flow_id: Hash32,
    now: Timestamp,
    target: Address,
    value: String,
    call_data: Vec<u8>,
    function_signature: Option<String>,
    initiator: Option<Address>,
    eta: Timestamp,
    grace_period_seconds: Option<i64>,
    tx_hash: Hash32,
) -> Flow {
    let mut flow = existing.unwrap_or_else(|| Flow::new(standard, chain_id, contract_address, flow_id, now));

    let should_fill_metadata = !flow.status.is_terminal() || flow.queue_tx_hash.is_none();
    if should_fill_metadata {
        flow.eta = Some(eta);
        flow.expired_at = grace_period_seconds.map(|g| eta + g);
        flow.queue_tx_hash = Some(tx_hash);
        flow.initiator_address = initiator;
        flow.target_address = Some(target);
        flow.value = Some(value);
        flow.call_data = Some(call_data);
        flow.function_signature = function_signature;
        flow.updated_at = now;
        if !flow.status.is_terminal() {
            flow.status = FlowStatus::Waiting;
        }
    }
    flow
}

fn apply_execute(
    existing: Option<Flow>,
    standard: TimelockStandard,
    chain_id: ChainId,
    contract_address: Address,
    flow_id: Hash32,
    now: Timestamp,
    tx_hash: Hash32,
) -> Flow {
    let mut flow = existing.unwrap_or_else(|| Flow::new(standard, chain_id, contract_address, flow_id, now));
    if !flow.status.is_terminal() {
        flow.status = FlowStatus::Executed;
        flow.execute_tx_hash = Some(tx_hash);
        flow.executed_at = Some(now);
        flow.updated_at = now;
    }
    flow
}

fn apply_cancel(
    existing: Option<Flow>,
    standard: TimelockStandard,
    chain_id: ChainId,
    contract_address: Address,
    flow_id: Hash32,
    now: Timestamp,
    tx_hash: Hash32,
) -> Flow {
    let mut flow = existing.unwrap_or_else(|| Flow::new(standard, chain_id, contract_address, flow_id, now));
    if !flow.status.is_terminal() {
        flow.status = FlowStatus::Cancelled;
        flow.cancel_tx_hash = Some(tx_hash);
        flow.cancelled_at = Some(now);
        flow.updated_at = now;
    }
    flow
}

pub struct CompoundEngine;

impl StandardEngine for CompoundEngine {
    fn apply(
        &self,
        contract: &WatchedContract,
        event: &EventRow,
        decoded: &DecodedEvent,
        existing: Option<Flow>,
    ) -> Option<Flow> {
        let DecodedEvent::Compound(inner) = decoded else { return None };
        let now = event.block_timestamp;
        match inner {
            CompoundEvent::QueueTransaction { flow_id, target, value, signature, data, eta } => Some(apply_queue(
                existing,
                event.standard,
                event.chain_id,
                event.contract_address,
                *flow_id,
                now,
                *target,
                value.clone(),
                data.clone(),
                Some(signature.clone()),
                event.from_address,
                *eta,
                Some(contract.grace_period_seconds()),
                event.tx_hash,
            )),
            CompoundEvent::ExecuteTransaction { flow_id, .. } => Some(apply_execute(
                existing,
                event.standard,
                event.chain_id,
                event.contract_address,
                *flow_id,
                now,
                event.tx_hash,
            )),
            CompoundEvent::CancelTransaction { flow_id, .. } => Some(apply_cancel(
                existing,
                event.standard,
                event.chain_id,
                event.contract_address,
                *flow_id,
                now,
                event.tx_hash,
            )),
            CompoundEvent::NewAdmin { .. }
            | CompoundEvent::NewPendingAdmin { .. }
            | CompoundEvent::NewDelay { .. } => None,
        }
    }
}

pub struct OpenZeppelinEngine;

impl StandardEngine for OpenZeppelinEngine {
    fn apply(
        &self,
        _contract: &WatchedContract,
        event: &EventRow,
        decoded: &DecodedEvent,
        existing: Option<Flow>,
    ) -> Option<Flow> {
        let DecodedEvent::OpenZeppelin(inner) = decoded else { return None };
        let now = event.block_timestamp;
        match inner {
            OpenZeppelinEvent::CallScheduled { id, target, value, data, delay_seconds, .. } => {
                let eta = now + delay_seconds;
                Some(apply_queue(
                    existing,
                    event.standard,
                    event.chain_id,
                    event.contract_address,
                    *id,
                    now,
                    *target,
                    value.clone(),
                    data.clone(),
                    sentinel_decode::derive_function_selector(data),
                    event.from_address,
                    eta,
                    None,
                    event.tx_hash,
                ))
            }
            OpenZeppelinEvent::CallExecuted { id, .. } => Some(apply_execute(
                existing,
                event.standard,
                event.chain_id,
                event.contract_address,
                *id,
                now,
                event.tx_hash,
            )),
            OpenZeppelinEvent::Cancelled { id } => Some(apply_cancel(
                existing,
                event.standard,
                event.chain_id,
                event.contract_address,
                *id,
                now,
                event.tx_hash,
            )),
            OpenZeppelinEvent::MinDelayChange { .. }
            | OpenZeppelinEvent::RoleGranted { .. }
            | OpenZeppelinEvent::RoleRevoked { .. }
            | OpenZeppelinEvent::RoleAdminChanged { .. } => None,
        }
    }
}
