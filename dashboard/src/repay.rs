use alloy_primitives::{Address, U256};
use common::ChainError;
use evm_interface::{ChainClient, ContractCall, Receipt};
use log::debug;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepayPhase {
    Approve,
    Repay,
}

impl fmt::Display for RepayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepayPhase::Approve => write!(f, "approve"),
            RepayPhase::Repay => write!(f, "repay"),
        }
    }
}

/// A repay that failed part way through.
///
/// An approve-phase failure means the repay call was never submitted. Nothing
/// is rolled back either way: an allowance granted before a failed repay stays
/// granted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Repay failed during the {phase} step: {source}")]
pub struct RepayError {
    pub phase: RepayPhase,
    pub source: ChainError,
}

/// Grants the lending contract a token allowance, then repays one loan with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproveThenRepay {
    pub spender: Address,
    pub amount: U256,
    /// 0-based position of the loan in the contract's loan array
    pub loan_index: u64,
}

impl ApproveThenRepay {
    /// Builds the operation from a 1-based loan number as shown to the user
    pub fn for_loan_number(spender: Address, amount: U256, loan_number: u64) -> Option<Self> {
        let loan_index = loan_number.checked_sub(1)?;
        Some(Self { spender, amount, loan_index })
    }

    pub async fn execute<C: ChainClient>(&self, client: &C) -> Result<Receipt, RepayError> {
        let approval = ContractCall::Approve { spender: self.spender, amount: self.amount };
        run_phase(client, RepayPhase::Approve, approval).await?;
        debug!("Allowance of {} granted to {}", self.amount, self.spender);

        let repay = ContractCall::RepayStableCoin {
            amount: self.amount,
            loan_indices: vec![self.loan_index],
        };
        run_phase(client, RepayPhase::Repay, repay).await
    }
}

async fn run_phase<C: ChainClient>(
    client: &C,
    phase: RepayPhase,
    call: ContractCall,
) -> Result<Receipt, RepayError> {
    let at_phase = |source| RepayError { phase, source };
    let handle = client.submit(call).await.map_err(at_phase)?;
    client.await_receipt(handle).await.map_err(at_phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;
    use alloy_primitives::address;

    const SPENDER: Address = address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0");

    #[test]
    fn test_loan_number_is_one_based() {
        let op = ApproveThenRepay::for_loan_number(SPENDER, U256::from(1u64), 2).unwrap();
        assert_eq!(op.loan_index, 1);
        assert!(ApproveThenRepay::for_loan_number(SPENDER, U256::from(1u64), 0).is_none());
    }

    #[tokio::test]
    async fn test_both_phases_in_order() {
        let client = MockChain::connected();
        let op = ApproveThenRepay::for_loan_number(SPENDER, U256::from(10u64), 3).unwrap();
        op.execute(&client).await.unwrap();

        assert_eq!(
            client.submitted(),
            vec![
                ContractCall::Approve { spender: SPENDER, amount: U256::from(10u64) },
                ContractCall::RepayStableCoin { amount: U256::from(10u64), loan_indices: vec![2] },
            ]
        );
    }

    #[tokio::test]
    async fn test_approve_receipt_failure_stops_before_repay() {
        let client = MockChain::connected();
        client.fail_receipt("approve", ChainError::Reverted { reason: None });

        let op = ApproveThenRepay::for_loan_number(SPENDER, U256::from(10u64), 1).unwrap();
        let err = op.execute(&client).await.unwrap_err();
        assert_eq!(err.phase, RepayPhase::Approve);
        assert_eq!(client.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_repay_phase_failure_is_labelled() {
        let client = MockChain::connected();
        client.fail_submit(
            "repayStableCoin",
            ChainError::Reverted { reason: Some("Loan does not exist".into()) },
        );

        let op = ApproveThenRepay::for_loan_number(SPENDER, U256::from(10u64), 9).unwrap();
        let err = op.execute(&client).await.unwrap_err();
        assert_eq!(err.phase, RepayPhase::Repay);
        assert_eq!(err.source.revert_reason(), Some("Loan does not exist"));
        assert_eq!(
            err.to_string(),
            "Repay failed during the repay step: Transaction reverted: Loan does not exist"
        );
    }
}
