use sentinel_core::{Address, ChainId, FlowStatus, Hash32, TimelockStandard};

/// Identifies one flow row, independent of its current status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FlowRef {
    pub standard: TimelockStandard,
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub flow_id: Hash32,
}

/// Emitted exactly once per real status transition, by either the flow
/// engine (C8, driven by incoming events) or the refresher (C9, driven by
/// wall-clock thresholds). Never emitted for a flow's initial creation —
/// arriving at `waiting` for the first time is not a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChanged {
    pub flow_ref: FlowRef,
    pub from: FlowStatus,
    pub to: FlowStatus,
    pub tx_hash: Option<Hash32>,
}
