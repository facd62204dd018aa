use alloy_primitives::{address, Address};
use serde::Serialize;
use std::sync::OnceLock;

/// Deployed contract addresses on one network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContractAddresses {
    pub lending_contract: Address,
    pub token_contract: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub chain_id: u64,
    pub addresses: ContractAddresses,
}

pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const LOCALHOST_CHAIN_ID: u64 = 31_337;

// Static network list using OnceLock for safe initialization
static NETWORKS: OnceLock<Vec<NetworkConfig>> = OnceLock::new();

// Get every network the dashboard knows contract deployments for
pub fn get_networks() -> &'static [NetworkConfig] {
    NETWORKS.get_or_init(|| {
        vec![
            NetworkConfig {
                name: "Sepolia",
                chain_id: SEPOLIA_CHAIN_ID,
                addresses: ContractAddresses {
                    lending_contract: address!("0821D98d8F35181a723044f98c3a8574a868Ac24"),
                    token_contract: address!("06962bd98FC86b694DDCEc738050F8e9153C8481"),
                },
            },
            NetworkConfig {
                name: "Localhost",
                chain_id: LOCALHOST_CHAIN_ID,
                addresses: ContractAddresses {
                    lending_contract: address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
                    token_contract: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
                },
            },
        ]
    })
}

pub fn get_network_by_chain_id(chain_id: u64) -> Option<&'static NetworkConfig> {
    get_networks().iter().find(|network| network.chain_id == chain_id)
}

pub fn get_network_by_name(name: &str) -> Option<&'static NetworkConfig> {
    get_networks().iter().find(|network| network.name.eq_ignore_ascii_case(name))
}
