use crate::notifications::Notification;
use common::{ChainSnapshot, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strum::{Display, EnumIter};

/// Text inputs of the dashboard forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FormField {
    CollateralAmount,
    WithdrawAmount,
    BorrowAmount,
    RepayLoanNumber,
    RepayAmount,
    LiquidateAddress,
}

/// Raw, unvalidated form input exactly as the user typed it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub collateral_amount: String,
    pub withdraw_amount: String,
    pub borrow_amount: String,
    pub repay_loan_number: String,
    pub repay_amount: String,
    pub liquidate_address: String,
}

impl FormState {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::CollateralAmount => &self.collateral_amount,
            FormField::WithdrawAmount => &self.withdraw_amount,
            FormField::BorrowAmount => &self.borrow_amount,
            FormField::RepayLoanNumber => &self.repay_loan_number,
            FormField::RepayAmount => &self.repay_amount,
            FormField::LiquidateAddress => &self.liquidate_address,
        }
    }

    pub fn set(&mut self, field: FormField, value: String) {
        let slot = match field {
            FormField::CollateralAmount => &mut self.collateral_amount,
            FormField::WithdrawAmount => &mut self.withdraw_amount,
            FormField::BorrowAmount => &mut self.borrow_amount,
            FormField::RepayLoanNumber => &mut self.repay_loan_number,
            FormField::RepayAmount => &mut self.repay_amount,
            FormField::LiquidateAddress => &mut self.liquidate_address,
        };
        *slot = value;
    }

    /// Whitespace-only input counts as empty
    pub fn is_empty(&self, field: FormField) -> bool {
        self.get(field).trim().is_empty()
    }
}

/// Everything the presentation layer renders from
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppState {
    pub connection: Option<Connection>,
    pub snapshot: ChainSnapshot,
    pub forms: FormState,
    pub is_loading: bool,
    pub notifications: Vec<Notification>,

    #[serde(skip)]
    pub(crate) last_notification_id: u64,
}

/// Shared handle to the application state.
///
/// The lock is only ever held for short synchronous updates, never across an
/// await point, so readers always observe whole snapshots.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<AppState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current state
    pub fn read(&self) -> AppState {
        self.lock().clone()
    }

    pub fn connection(&self) -> Option<Connection> {
        self.lock().connection
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn set_field(&self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        self.update(|state| state.forms.set(field, value));
    }
}

/// Clears the loading flag when dropped, whichever way an action exits
#[derive(Debug)]
pub struct LoadingGuard {
    store: Store,
}

impl LoadingGuard {
    /// Runs `check` and, only if it passes, sets the loading flag in the same update
    pub fn try_engage<R>(
        store: &Store,
        check: impl FnOnce(&AppState) -> Option<R>,
    ) -> Option<(R, Self)> {
        let checked = store.update(|state| {
            let checked = check(state)?;
            state.is_loading = true;
            Some(checked)
        })?;
        Some((checked, Self { store: store.clone() }))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.store.update(|state| state.is_loading = false);
    }
}
