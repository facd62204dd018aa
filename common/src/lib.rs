use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod amount;
pub mod lending;
pub mod network;
pub use lending::*;

/// A single loan as reported by the lending contract.
///
/// Loans have no stable identifier; their position in the contract's array is
/// the only handle the repay call accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Borrowed stablecoin amount, 18-decimal fixed point
    pub principal: U256,
    /// Accrued interest, 18-decimal fixed point
    pub interest: U256,
}

/// Everything the dashboard shows about the connected account, read in one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub collateral_balance: U256,
    pub loans: Vec<Loan>,
    pub user_token_balance: U256,
    pub contract_token_balance: U256,

    // None until the first refresh completes
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// An authorized wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub account: Address,
    pub network: &'static network::NetworkConfig,
}

/// Shortens an address for display, e.g. `0x5FbD...0aa3`.
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
