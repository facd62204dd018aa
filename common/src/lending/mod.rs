use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("No wallet provider available")]
    WalletUnavailable,

    #[error("Request rejected in wallet")]
    UserRejected,

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Unsupported network with chain id {0}")]
    UnsupportedNetwork(u64),

    // reason is best-effort, some providers strip it
    #[error("Transaction reverted: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Reverted { reason: Option<String> },

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl ChainError {
    /// The contract-supplied revert reason, if one survived the trip through the provider.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            ChainError::Reverted { reason } => reason.as_deref(),
            _ => None,
        }
    }
}
