use alloy_primitives::{Address, B256, U256};
use common::{ChainError, Connection, Loan};
use serde::Serialize;
use std::future::Future;

/// A state-mutating call against one of the two dashboard contracts.
///
/// Amounts are already scaled to 18-decimal fixed point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    /// `depositCollateral()` on the lending contract, paying `value` wei
    DepositCollateral { value: U256 },
    BorrowStableCoin { amount: U256 },
    /// `repayStableCoin(amount, loanIndices)`, indices are 0-based
    RepayStableCoin { amount: U256, loan_indices: Vec<u64> },
    WithdrawCollateral { amount: U256 },
    Liquidate { borrower: Address },
    /// `approve(spender, amount)` on the token contract
    Approve { spender: Address, amount: U256 },
    Faucet { recipient: Address, amount: U256 },
}

impl ContractCall {
    pub fn method_name(&self) -> &'static str {
        match self {
            ContractCall::DepositCollateral { .. } => "depositCollateral",
            ContractCall::BorrowStableCoin { .. } => "borrowStableCoin",
            ContractCall::RepayStableCoin { .. } => "repayStableCoin",
            ContractCall::WithdrawCollateral { .. } => "withdrawCollateral",
            ContractCall::Liquidate { .. } => "liquidate",
            ContractCall::Approve { .. } => "approve",
            ContractCall::Faucet { .. } => "faucet",
        }
    }
}

/// A submitted, not yet confirmed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxHandle {
    pub hash: B256,
}

/// A mined transaction that executed successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: u64,
}

/// Read and write access to the lending and token contracts through a wallet.
///
/// Reads never mutate chain state. Writes are signed by the connected account,
/// so every method other than `connect` fails with `NotConnected` until a
/// connection has been established.
pub trait ChainClient: Send + Sync {
    /// Requests wallet authorization and resolves the active network
    fn connect(&self) -> impl Future<Output = Result<Connection, ChainError>> + Send;

    /// Collateral deposited by `account`, in wei
    fn read_collateral(
        &self,
        account: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    /// Open loans of `account` in contract order
    fn read_loans(
        &self,
        account: Address,
    ) -> impl Future<Output = Result<Vec<Loan>, ChainError>> + Send;

    /// Test token balance held by `holder`
    fn read_token_balance(
        &self,
        holder: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    fn submit(
        &self,
        call: ContractCall,
    ) -> impl Future<Output = Result<TxHandle, ChainError>> + Send;

    /// Waits until the transaction is mined; a reverted transaction is an error
    fn await_receipt(
        &self,
        handle: TxHandle,
    ) -> impl Future<Output = Result<Receipt, ChainError>> + Send;
}
