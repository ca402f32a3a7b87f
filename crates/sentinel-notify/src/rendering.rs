use sentinel_chain::Chain;
use sentinel_flow::StatusChanged;
use sentinel_store::WatchedContract;

/// A channel-agnostic rendered message. Each [`crate::channels::ChannelAdapter`]
/// picks whichever of `subject`/`text` its wire format needs.
#[derive(Clone, Debug)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
}

pub fn render(chain: &Chain, contract: &WatchedContract, change: &StatusChanged) -> RenderedMessage {
    let subject = format!(
        "[{}] {} proposal {} \u{2192} {}",
        chain.name, contract.standard, change.from, change.to
    );

    let mut text = format!(
        "Chain: {}\nContract: {} ({})\nStatus: {} \u{2192} {}\n",
        chain.name, contract.contract_address, contract.standard, change.from, change.to
    );

    if let Some(tx_hash) = change.tx_hash {
        if let Some(explorer) = chain.explorer_urls.first() {
            text.push_str(&format!("Transaction: {}/tx/{}\n", explorer.trim_end_matches('/'), tx_hash.to_hex()));
        }
    }

    RenderedMessage { subject, text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::{Address, FlowStatus, Hash32, TimelockStandard};
    use sentinel_flow::FlowRef;
    use sentinel_store::{CompoundFields, ContractStatus, StandardFields};

    #[test]
    fn includes_explorer_link_when_tx_hash_present() {
        let chain = Chain {
            chain_id: 1,
            name: "Ethereum Mainnet".to_string(),
            rpc_url: "https://example.invalid".to_string(),
            explorer_urls: vec!["https://etherscan.io".to_string()],
            is_testnet: false,
            is_active: true,
            block_time_seconds: 12,
        };
        let contract = WatchedContract {
            standard: TimelockStandard::Compound,
            chain_id: 1,
            contract_address: Address::from_bytes([1u8; 20]),
            creator_address: Address::from_bytes([9u8; 20]),
            min_delay_seconds: 3600,
            grace_period_seconds: None,
            remark: None,
            status: ContractStatus::Active,
            imported: false,
            created_at: 1_700_000_000,
            fields: StandardFields::Compound(CompoundFields { admin: Address::ZERO, pending_admin: None }),
        };
        let change = StatusChanged {
            flow_ref: FlowRef {
                standard: TimelockStandard::Compound,
                chain_id: 1,
                contract_address: contract.contract_address,
                flow_id: Hash32::from_bytes([2u8; 32]),
            },
            from: FlowStatus::Waiting,
            to: FlowStatus::Ready,
            tx_hash: Some(Hash32::from_bytes([3u8; 32])),
        };

        let rendered = render(&chain, &contract, &change);
        assert!(rendered.text.contains("https://etherscan.io/tx/0x03"));
    }
}
