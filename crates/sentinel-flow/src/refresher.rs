use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use sentinel_core::{FlowStatus, SentinelError, TimelockStandard, Timestamp};
use sentinel_store::{Flow, StoreDb};

use crate::status::{FlowRef, StatusChanged};

fn status_changed(flow: &Flow, from: FlowStatus) -> StatusChanged {
    StatusChanged {
        flow_ref: FlowRef {
            standard: flow.standard,
            chain_id: flow.chain_id,
            contract_address: flow.contract_address,
            flow_id: flow.flow_id,
        },
        from,
        to: flow.status,
        tx_hash: None,
    }
}

/// One refresher pass (C9): time-driven transitions that no on-chain event
/// causes directly. Both queries below read from the status-indexed
/// secondary tree (`flows_by_status`), never a full scan of the flow table.
pub fn refresh_once(store: &StoreDb, now: Timestamp, batch_size: usize) -> Result<Vec<StatusChanged>, SentinelError> {
    let mut changes = Vec::new();

    // Filter to due flows first, then bound by batch_size — bounding the
    // candidate window before filtering would let a handful of not-yet-due
    // waiting flows that sort ahead in the index starve a due one forever.
    let due: Vec<Flow> = store
        .flows_by_status(FlowStatus::Waiting)?
        .into_iter()
        .filter(|flow| flow.eta.is_some_and(|eta| eta <= now))
        .take(batch_size)
        .collect();
    for mut flow in due {
        let from = flow.status;
        flow.status = FlowStatus::Ready;
        flow.updated_at = now;
        store.upsert_flow(&flow)?;
        changes.push(status_changed(&flow, from));
    }

    let mut expired_budget = batch_size;
    for status in [FlowStatus::Waiting, FlowStatus::Ready] {
        if expired_budget == 0 {
            break;
        }
        let due: Vec<Flow> = store
            .flows_by_status(status)?
            .into_iter()
            .filter(|flow| {
                flow.standard == TimelockStandard::Compound
                    && flow.expired_at.is_some_and(|expired_at| expired_at <= now)
            })
            .take(expired_budget)
            .collect();
        for mut flow in due {
            let from = flow.status;
            flow.status = FlowStatus::Expired;
            flow.updated_at = now;
            store.upsert_flow(&flow)?;
            changes.push(status_changed(&flow, from));
            expired_budget = expired_budget.saturating_sub(1);
        }
    }

    Ok(changes)
}

/// Runs the refresher on a fixed interval until `shutdown` reports `true`,
/// forwarding each tick's transitions to the dispatcher channel (C10). The
/// current pass always finishes before the loop checks shutdown again,
/// matching the lifecycle's "let the in-flight pass complete" rule.
pub async fn run(
    store: Arc<StoreDb>,
    interval: Duration,
    batch_size: usize,
    sender: mpsc::Sender<StatusChanged>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = chrono::Utc::now().timestamp();
                match refresh_once(&store, now, batch_size) {
                    Ok(changes) => {
                        for change in changes {
                            if sender.send(change).await.is_err() {
                                tracing::warn!("notification channel closed, dropping refresher transition");
                            }
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "flow refresher pass failed"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::info!("flow refresher shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::Address;

    fn sample_flow(status: FlowStatus, eta: Option<Timestamp>, expired_at: Option<Timestamp>) -> Flow {
        let mut flow = Flow::new(
            TimelockStandard::Compound,
            1,
            Address::from_bytes([1u8; 20]),
            sentinel_core::Hash32::from_bytes([2u8; 32]),
            1_700_000_000,
        );
        flow.status = status;
        flow.eta = eta;
        flow.expired_at = expired_at;
        flow
    }

    #[test]
    fn waiting_flow_past_eta_becomes_ready() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreDb::open(dir.path()).unwrap();
        let flow = sample_flow(FlowStatus::Waiting, Some(1_700_000_000), Some(1_800_000_000));
        store.upsert_flow(&flow).unwrap();

        let changes = refresh_once(&store, 1_700_000_001, 500).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].from, FlowStatus::Waiting);
        assert_eq!(changes[0].to, FlowStatus::Ready);

        let stored = store
            .get_flow(TimelockStandard::Compound, 1, Address::from_bytes([1u8; 20]), sentinel_core::Hash32::from_bytes([2u8; 32]))
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, FlowStatus::Ready);
    }

    #[test]
    fn compound_flow_past_expiry_becomes_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreDb::open(dir.path()).unwrap();
        let flow = sample_flow(FlowStatus::Ready, Some(1_700_000_000), Some(1_700_000_500));
        store.upsert_flow(&flow).unwrap();

        let changes = refresh_once(&store, 1_700_000_600, 500).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].to, FlowStatus::Expired);
    }

    #[test]
    fn terminal_flows_are_never_touched() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreDb::open(dir.path()).unwrap();
        let mut flow = sample_flow(FlowStatus::Executed, Some(1_700_000_000), Some(1_700_000_500));
        flow.executed_at = Some(1_699_999_999);
        store.upsert_flow(&flow).unwrap();

        let changes = refresh_once(&store, 1_700_000_600, 500).unwrap();
        assert!(changes.is_empty());
    }
}
