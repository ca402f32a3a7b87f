use ethabi::{Event, EventParam, ParamType};
use once_cell::sync::Lazy;
use sentinel_core::Hash32;

fn event(name: &str, inputs: Vec<(&str, ParamType, bool)>) -> Event {
    Event {
        name: name.to_string(),
        inputs: inputs
            .into_iter()
            .map(|(name, kind, indexed)| EventParam {
                name: name.to_string(),
                kind,
                indexed,
            })
            .collect(),
        anonymous: false,
    }
}

fn topic0(e: &Event) -> Hash32 {
    Hash32::from_bytes(e.signature().0)
}

/// `Timelock.sol` (Compound Governor's admin timelock) event set.
pub struct CompoundAbi {
    pub queue_transaction: Event,
    pub execute_transaction: Event,
    pub cancel_transaction: Event,
    pub new_admin: Event,
    pub new_pending_admin: Event,
    pub new_delay: Event,
}

impl CompoundAbi {
    fn build() -> Self {
        let queued_shape = vec![
            ("txHash", ParamType::FixedBytes(32), true),
            ("target", ParamType::Address, true),
            ("value", ParamType::Uint(256), false),
            ("signature", ParamType::String, false),
            ("data", ParamType::Bytes, false),
            ("eta", ParamType::Uint(256), false),
        ];
        CompoundAbi {
            queue_transaction: event("QueueTransaction", queued_shape.clone()),
            execute_transaction: event("ExecuteTransaction", queued_shape.clone()),
            cancel_transaction: event("CancelTransaction", queued_shape),
            new_admin: event("NewAdmin", vec![("newAdmin", ParamType::Address, true)]),
            new_pending_admin: event(
                "NewPendingAdmin",
                vec![("newPendingAdmin", ParamType::Address, true)],
            ),
            new_delay: event("NewDelay", vec![("newDelay", ParamType::Uint(256), true)]),
        }
    }

    /// All events keyed by topic0, for dispatch on an incoming log.
    pub fn by_topic0(&self) -> Vec<(Hash32, &Event, &'static str)> {
        vec![
            (topic0(&self.queue_transaction), &self.queue_transaction, "QueueTransaction"),
            (
                topic0(&self.execute_transaction),
                &self.execute_transaction,
                "ExecuteTransaction",
            ),
            (
                topic0(&self.cancel_transaction),
                &self.cancel_transaction,
                "CancelTransaction",
            ),
            (topic0(&self.new_admin), &self.new_admin, "NewAdmin"),
            (
                topic0(&self.new_pending_admin),
                &self.new_pending_admin,
                "NewPendingAdmin",
            ),
            (topic0(&self.new_delay), &self.new_delay, "NewDelay"),
        ]
    }

    /// Topic0 set used to build the `eth_getLogs` filter for Compound
    /// contracts.
    pub fn all_topics(&self) -> Vec<Hash32> {
        self.by_topic0().into_iter().map(|(t, _, _)| t).collect()
    }
}

pub static COMPOUND: Lazy<CompoundAbi> = Lazy::new(CompoundAbi::build);

/// OpenZeppelin `TimelockController` event set.
pub struct OpenZeppelinAbi {
    pub call_scheduled: Event,
    pub call_executed: Event,
    pub cancelled: Event,
    pub min_delay_change: Event,
    pub role_granted: Event,
    pub role_revoked: Event,
    pub role_admin_changed: Event,
}

impl OpenZeppelinAbi {
    fn build() -> Self {
        OpenZeppelinAbi {
            call_scheduled: event(
                "CallScheduled",
                vec![
                    ("id", ParamType::FixedBytes(32), true),
                    ("index", ParamType::Uint(256), true),
                    ("target", ParamType::Address, false),
                    ("value", ParamType::Uint(256), false),
                    ("data", ParamType::Bytes, false),
                    ("predecessor", ParamType::FixedBytes(32), false),
                    ("delay", ParamType::Uint(256), false),
                ],
            ),
            call_executed: event(
                "CallExecuted",
                vec![
                    ("id", ParamType::FixedBytes(32), true),
                    ("index", ParamType::Uint(256), true),
                    ("target", ParamType::Address, false),
                    ("value", ParamType::Uint(256), false),
                    ("data", ParamType::Bytes, false),
                ],
            ),
            cancelled: event("Cancelled", vec![("id", ParamType::FixedBytes(32), true)]),
            min_delay_change: event(
                "MinDelayChange",
                vec![
                    ("oldDuration", ParamType::Uint(256), false),
                    ("newDuration", ParamType::Uint(256), false),
                ],
            ),
            role_granted: event(
                "RoleGranted",
                vec![
                    ("role", ParamType::FixedBytes(32), true),
                    ("account", ParamType::Address, true),
                    ("sender", ParamType::Address, true),
                ],
            ),
            role_revoked: event(
                "RoleRevoked",
                vec![
                    ("role", ParamType::FixedBytes(32), true),
                    ("account", ParamType::Address, true),
                    ("sender", ParamType::Address, true),
                ],
            ),
            role_admin_changed: event(
                "RoleAdminChanged",
                vec![
                    ("role", ParamType::FixedBytes(32), true),
                    ("previousAdminRole", ParamType::FixedBytes(32), true),
                    ("newAdminRole", ParamType::FixedBytes(32), true),
                ],
            ),
        }
    }

    pub fn by_topic0(&self) -> Vec<(Hash32, &Event, &'static str)> {
        vec![
            (topic0(&self.call_scheduled), &self.call_scheduled, "CallScheduled"),
            (topic0(&self.call_executed), &self.call_executed, "CallExecuted"),
            (topic0(&self.cancelled), &self.cancelled, "Cancelled"),
            (
                topic0(&self.min_delay_change),
                &self.min_delay_change,
                "MinDelayChange",
            ),
            (topic0(&self.role_granted), &self.role_granted, "RoleGranted"),
            (topic0(&self.role_revoked), &self.role_revoked, "RoleRevoked"),
            (
                topic0(&self.role_admin_changed),
                &self.role_admin_changed,
                "RoleAdminChanged",
            ),
        ]
    }

    pub fn all_topics(&self) -> Vec<Hash32> {
        self.by_topic0().into_iter().map(|(t, _, _)| t).collect()
    }
}

pub static OPENZEPPELIN: Lazy<OpenZeppelinAbi> = Lazy::new(OpenZeppelinAbi::build);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_topics_are_distinct() {
        let topics = COMPOUND.all_topics();
        let unique: std::collections::HashSet<_> = topics.iter().collect();
        assert_eq!(topics.len(), unique.len());
    }

    #[test]
    fn oz_topics_are_distinct() {
        let topics = OPENZEPPELIN.all_topics();
        let unique: std::collections::HashSet<_> = topics.iter().collect();
        assert_eq!(topics.len(), unique.len());
    }
}
