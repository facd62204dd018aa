use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON-RPC endpoint of the wallet provider. `None` means no wallet is installed.
    pub wallet_rpc_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub receipt_poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let wallet_rpc_url =
            lookup("WALLET_RPC_URL").map(|url| url.trim().to_string()).filter(|url| !url.is_empty());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid BIND_ADDR: {}", bind_addr))?;

        let poll_ms = match lookup("RECEIPT_POLL_MS") {
            Some(value) => value
                .parse::<u64>()
                .with_context(|| format!("Invalid RECEIPT_POLL_MS: {}", value))?,
            None => DEFAULT_RECEIPT_POLL_MS,
        };

        Ok(Self {
            wallet_rpc_url,
            bind_addr,
            receipt_poll_interval: Duration::from_millis(poll_ms),
        })
    }
}
