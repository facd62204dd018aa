use crate::common::client_trait::ContractCall;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use common::network::ContractAddresses;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct LoanStatus {
        uint256 principal;
        uint256 interest;
    }

    // Lending contract
    function loanAccounts(address account) external view returns (uint256 collateral);
    function getLoanStatus(address account) external view returns (LoanStatus[] loans);
    function depositCollateral() external payable;
    function borrowStableCoin(uint256 amount) external;
    function repayStableCoin(uint256 amount, uint256[] loanIndices) external;
    function withdrawCollateral(uint256 amount) external;
    function liquidate(address borrower) external;

    // Test token contract
    function balanceOf(address account) external view returns (uint256 balance);
    function approve(address spender, uint256 amount) external returns (bool approved);
    function faucet(address to, uint256 amount) external;
}

/// A contract call ready to be placed in a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    pub to: Address,
    pub data: Vec<u8>,
    pub value: U256,
}

impl ContractCall {
    /// ABI-encodes the call against the contracts deployed at `addresses`
    pub fn encode(&self, addresses: &ContractAddresses) -> EncodedCall {
        let lending = addresses.lending_contract;
        let token = addresses.token_contract;

        let (to, data, value) = match self {
            ContractCall::DepositCollateral { value } => {
                (lending, depositCollateralCall {}.abi_encode(), *value)
            }
            ContractCall::BorrowStableCoin { amount } => {
                (lending, borrowStableCoinCall { amount: *amount }.abi_encode(), U256::ZERO)
            }
            ContractCall::RepayStableCoin { amount, loan_indices } => {
                let call = repayStableCoinCall {
                    amount: *amount,
                    loanIndices: loan_indices.iter().map(|&index| U256::from(index)).collect(),
                };
                (lending, call.abi_encode(), U256::ZERO)
            }
            ContractCall::WithdrawCollateral { amount } => {
                (lending, withdrawCollateralCall { amount: *amount }.abi_encode(), U256::ZERO)
            }
            ContractCall::Liquidate { borrower } => {
                (lending, liquidateCall { borrower: *borrower }.abi_encode(), U256::ZERO)
            }
            ContractCall::Approve { spender, amount } => {
                (token, approveCall { spender: *spender, amount: *amount }.abi_encode(), U256::ZERO)
            }
            ContractCall::Faucet { recipient, amount } => {
                (token, faucetCall { to: *recipient, amount: *amount }.abi_encode(), U256::ZERO)
            }
        };

        EncodedCall { to, data, value }
    }
}

impl From<LoanStatus> for common::Loan {
    fn from(status: LoanStatus) -> Self {
        common::Loan { principal: status.principal, interest: status.interest }
    }
}
