use crate::notifications::NotificationKind;
use crate::repay::{ApproveThenRepay, RepayError};
use crate::state::{AppState, FormField, LoadingGuard, Store};
use crate::view::{render, DashboardView};
use alloy_primitives::Address;
use chrono::Utc;
use common::amount::{parse_ether, AmountError};
use common::{ChainError, ChainSnapshot, Connection};
use evm_interface::{ChainClient, ContractCall, Receipt};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use strum::Display;
use thiserror::Error;

/// Tokens minted per faucet request, in whole tokens
pub const FAUCET_AMOUNT: &str = "1000";

const NO_WALLET_MESSAGE: &str = "Please install a wallet to use this app";
const CONNECT_FAILED_MESSAGE: &str = "Failed to connect wallet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    DepositCollateral,
    WithdrawCollateral,
    Borrow,
    Repay,
    Liquidate,
    Faucet,
}

impl Action {
    /// Form fields that must be filled in before the action can run
    pub fn required_fields(&self) -> &'static [FormField] {
        match self {
            Action::DepositCollateral => &[FormField::CollateralAmount],
            Action::WithdrawCollateral => &[FormField::WithdrawAmount],
            Action::Borrow => &[FormField::BorrowAmount],
            Action::Repay => &[FormField::RepayAmount, FormField::RepayLoanNumber],
            Action::Liquidate => &[FormField::LiquidateAddress],
            Action::Faucet => &[],
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Action::DepositCollateral => "Collateral deposited successfully!",
            Action::WithdrawCollateral => "Collateral withdrawn successfully!",
            Action::Borrow => "Stablecoin borrowed successfully!",
            Action::Repay => "Loan repaid successfully!",
            Action::Liquidate => "Position liquidated successfully!",
            Action::Faucet => "Test tokens received successfully!",
        }
    }

    /// Shown when a failure carries no revert reason
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Action::DepositCollateral => "Failed to deposit collateral",
            Action::WithdrawCollateral => "Failed to withdraw collateral",
            Action::Borrow => "Failed to borrow stablecoin",
            Action::Repay => "Failed to repay loan",
            Action::Liquidate => "Failed to liquidate position",
            Action::Faucet => "Failed to get test tokens",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Required input missing or no wallet connected; nothing was attempted
    #[error("{0} skipped")]
    Skipped(Action),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Repay(#[from] RepayError),
}

impl ActionError {
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            ActionError::Chain(error) => error.revert_reason(),
            ActionError::Repay(error) => error.source.revert_reason(),
            _ => None,
        }
    }

    /// The message a failed action shows to the user
    pub fn user_message(&self, action: Action) -> String {
        self.revert_reason().unwrap_or(action.fallback_message()).to_string()
    }
}

impl From<AmountError> for ActionError {
    fn from(error: AmountError) -> Self {
        ActionError::InvalidInput(error.to_string())
    }
}

/// An action that passed its guard; loading stays set until this is dropped
struct Started {
    connection: Connection,
    inputs: Vec<String>,
    _loading: LoadingGuard,
}

/// Runs user actions against the chain and keeps the store in step with it
pub struct Dashboard<C> {
    client: Arc<C>,
    store: Store,
}

impl<C> Clone for Dashboard<C> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), store: self.store.clone() }
    }
}

impl<C: ChainClient> Dashboard<C> {
    pub fn new(client: C) -> Self {
        Self { client: Arc::new(client), store: Store::new() }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn state(&self) -> AppState {
        self.store.read()
    }

    pub fn view(&self) -> DashboardView {
        render(&self.store.read())
    }

    pub fn set_field(&self, field: FormField, value: impl Into<String>) {
        self.store.set_field(field, value);
    }

    pub fn dismiss_notification(&self, id: u64) -> bool {
        self.store.dismiss(id)
    }

    /// Asks the wallet for an account and loads its state.
    ///
    /// Failures become an error notification and leave the dashboard disconnected.
    pub async fn connect(&self) -> Result<Connection, ActionError> {
        match self.client.connect().await {
            Ok(connection) => {
                self.store.update(|state| state.connection = Some(connection));
                info!("Wallet connected: {}", connection.account);
                self.refresh_logged().await;
                Ok(connection)
            }
            Err(e) => {
                error!("Error connecting wallet: {}", e);
                let message = match &e {
                    ChainError::WalletUnavailable => NO_WALLET_MESSAGE,
                    other => other.revert_reason().unwrap_or(CONNECT_FAILED_MESSAGE),
                };
                self.store.notify(message, NotificationKind::Error);
                Err(e.into())
            }
        }
    }

    /// Re-reads the whole chain snapshot for the connected account.
    ///
    /// Returns `Ok(false)` without touching the chain when nothing is connected.
    /// The four reads are not atomic on chain, but the store swaps the snapshot
    /// in a single update.
    pub async fn refresh(&self) -> Result<bool, ChainError> {
        let Some(connection) = self.store.connection() else {
            return Ok(false);
        };
        let account = connection.account;
        let lending = connection.network.addresses.lending_contract;

        let collateral_balance = self.client.read_collateral(account).await?;
        let loans = self.client.read_loans(account).await?;
        let user_token_balance = self.client.read_token_balance(account).await?;
        let contract_token_balance = self.client.read_token_balance(lending).await?;

        let snapshot = ChainSnapshot {
            collateral_balance,
            loans,
            user_token_balance,
            contract_token_balance,
            refreshed_at: Some(Utc::now()),
        };
        debug!("Refreshed snapshot for {}: {} loans", account, snapshot.loans.len());
        self.store.update(|state| state.snapshot = snapshot);

        Ok(true)
    }

    async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            error!("Error loading user data: {}", e);
        }
    }

    pub async fn deposit_collateral(&self) -> Result<Receipt, ActionError> {
        let action = Action::DepositCollateral;
        let started = self.start(action)?;
        let outcome = async {
            let value = parse_ether(&started.inputs[0])?;
            self.transact(ContractCall::DepositCollateral { value }).await
        }
        .await;
        self.finish(action, started, outcome).await
    }

    pub async fn withdraw_collateral(&self) -> Result<Receipt, ActionError> {
        let action = Action::WithdrawCollateral;
        let started = self.start(action)?;
        let outcome = async {
            let amount = parse_ether(&started.inputs[0])?;
            self.transact(ContractCall::WithdrawCollateral { amount }).await
        }
        .await;
        self.finish(action, started, outcome).await
    }

    pub async fn borrow(&self) -> Result<Receipt, ActionError> {
        let action = Action::Borrow;
        let started = self.start(action)?;
        let outcome = async {
            let amount = parse_ether(&started.inputs[0])?;
            self.transact(ContractCall::BorrowStableCoin { amount }).await
        }
        .await;
        self.finish(action, started, outcome).await
    }

    /// Approves the lending contract for the repay amount, then repays the
    /// loan whose 1-based number is in the form.
    pub async fn repay(&self) -> Result<Receipt, ActionError> {
        let action = Action::Repay;
        let started = self.start(action)?;
        let outcome = async {
            let amount = parse_ether(&started.inputs[0])?;
            let loan_number = parse_loan_number(&started.inputs[1])?;
            let spender = started.connection.network.addresses.lending_contract;
            let operation = ApproveThenRepay::for_loan_number(spender, amount, loan_number)
                .ok_or_else(|| ActionError::InvalidInput("Loan numbers start at 1".into()))?;
            operation.execute(self.client.as_ref()).await.map_err(ActionError::from)
        }
        .await;
        self.finish(action, started, outcome).await
    }

    pub async fn liquidate(&self) -> Result<Receipt, ActionError> {
        let action = Action::Liquidate;
        let started = self.start(action)?;
        let outcome = async {
            let borrower = Address::from_str(&started.inputs[0])
                .map_err(|e| ActionError::InvalidInput(format!("Invalid address: {}", e)))?;
            self.transact(ContractCall::Liquidate { borrower }).await
        }
        .await;
        self.finish(action, started, outcome).await
    }

    /// Mints test tokens to the connected account
    pub async fn faucet(&self) -> Result<Receipt, ActionError> {
        let action = Action::Faucet;
        let started = self.start(action)?;
        let outcome = async {
            let amount = parse_ether(FAUCET_AMOUNT)?;
            let recipient = started.connection.account;
            self.transact(ContractCall::Faucet { recipient, amount }).await
        }
        .await;
        self.finish(action, started, outcome).await
    }

    pub async fn run(&self, action: Action) -> Result<Receipt, ActionError> {
        match action {
            Action::DepositCollateral => self.deposit_collateral().await,
            Action::WithdrawCollateral => self.withdraw_collateral().await,
            Action::Borrow => self.borrow().await,
            Action::Repay => self.repay().await,
            Action::Liquidate => self.liquidate().await,
            Action::Faucet => self.faucet().await,
        }
    }

    // Checks the guard and raises the loading flag in one store update
    fn start(&self, action: Action) -> Result<Started, ActionError> {
        let engaged = LoadingGuard::try_engage(&self.store, |state| {
            let connection = state.connection?;
            let fields = action.required_fields();
            if fields.iter().any(|&field| state.forms.is_empty(field)) {
                return None;
            }
            let inputs = fields.iter().map(|&field| state.forms.get(field).trim().to_string());
            Some((connection, inputs.collect::<Vec<_>>()))
        });

        let Some(((connection, inputs), loading)) = engaged else {
            debug!("Skipping {}: wallet not connected or input missing", action);
            return Err(ActionError::Skipped(action));
        };

        info!("Starting {}", action);
        Ok(Started { connection, inputs, _loading: loading })
    }

    async fn finish(
        &self,
        action: Action,
        started: Started,
        outcome: Result<Receipt, ActionError>,
    ) -> Result<Receipt, ActionError> {
        match &outcome {
            Ok(receipt) => {
                info!("{} confirmed in block {}", action, receipt.block_number);
                self.store.update(|state| {
                    for &field in action.required_fields() {
                        state.forms.set(field, String::new());
                    }
                });
                self.store.notify(action.success_message(), NotificationKind::Success);
            }
            Err(e) => {
                error!("Error during {}: {}", action, e);
                self.store.notify(e.user_message(action), NotificationKind::Error);
            }
        }

        drop(started);

        if outcome.is_ok() {
            self.refresh_logged().await;
        }
        outcome
    }

    async fn transact(&self, call: ContractCall) -> Result<Receipt, ActionError> {
        let method = call.method_name();
        let handle = self.client.submit(call).await?;
        debug!("{} submitted as {}", method, handle.hash);
        Ok(self.client.await_receipt(handle).await?)
    }
}

fn parse_loan_number(input: &str) -> Result<u64, ActionError> {
    let invalid = || ActionError::InvalidInput(format!("Invalid loan number: {}", input));
    // u64::from_str would also take a leading '+'
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    input.parse::<u64>().map_err(|_| invalid())
}
