use crate::state::Store;
use alloy_primitives::{address, Address, B256, U256};
use common::network::{get_network_by_chain_id, LOCALHOST_CHAIN_ID};
use common::{ChainError, ChainSnapshot, Connection, Loan};
use evm_interface::{ChainClient, ContractCall, Receipt, TxHandle};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// In-memory `ChainClient` recording every call made through it
pub struct MockChain {
    connect_result: Mutex<Result<Connection, ChainError>>,
    chain_state: Mutex<ChainSnapshot>,
    read_error: Mutex<Option<ChainError>>,
    submit_failures: Mutex<HashMap<&'static str, ChainError>>,
    receipt_failures: Mutex<HashMap<&'static str, ChainError>>,
    submitted: Mutex<Vec<ContractCall>>,
    // loading flag as seen by each submit, when a store is observed
    observer: Mutex<Option<Store>>,
    loading_at_submit: Mutex<Vec<bool>>,
    collateral_reads: AtomicUsize,
}

pub fn localhost_connection() -> Connection {
    let network = get_network_by_chain_id(LOCALHOST_CHAIN_ID).unwrap();
    Connection { account: ACCOUNT, network }
}

impl MockChain {
    pub fn connected() -> Self {
        Self {
            connect_result: Mutex::new(Ok(localhost_connection())),
            chain_state: Mutex::new(ChainSnapshot::default()),
            read_error: Mutex::new(None),
            submit_failures: Mutex::new(HashMap::new()),
            receipt_failures: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            observer: Mutex::new(None),
            loading_at_submit: Mutex::new(Vec::new()),
            collateral_reads: AtomicUsize::new(0),
        }
    }

    pub fn failing_connect(error: ChainError) -> Self {
        let mock = Self::connected();
        *mock.connect_result.lock().unwrap() = Err(error);
        mock
    }

    pub fn set_chain_state(&self, snapshot: ChainSnapshot) {
        *self.chain_state.lock().unwrap() = snapshot;
    }

    pub fn set_loans(&self, count: u64) {
        let loans = (1..=count)
            .map(|i| Loan { principal: U256::from(i * 100), interest: U256::from(i) })
            .collect();
        self.chain_state.lock().unwrap().loans = loans;
    }

    pub fn fail_reads(&self, error: ChainError) {
        *self.read_error.lock().unwrap() = Some(error);
    }

    pub fn fail_submit(&self, method: &'static str, error: ChainError) {
        self.submit_failures.lock().unwrap().insert(method, error);
    }

    pub fn fail_receipt(&self, method: &'static str, error: ChainError) {
        self.receipt_failures.lock().unwrap().insert(method, error);
    }

    pub fn observe(&self, store: &Store) {
        *self.observer.lock().unwrap() = Some(store.clone());
    }

    pub fn submitted(&self) -> Vec<ContractCall> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn loading_at_submit(&self) -> Vec<bool> {
        self.loading_at_submit.lock().unwrap().clone()
    }

    /// Each refresh reads collateral exactly once
    pub fn refresh_count(&self) -> usize {
        self.collateral_reads.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> Result<(), ChainError> {
        match self.read_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl ChainClient for MockChain {
    async fn connect(&self) -> Result<Connection, ChainError> {
        self.connect_result.lock().unwrap().clone()
    }

    async fn read_collateral(&self, _account: Address) -> Result<U256, ChainError> {
        self.collateral_reads.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        Ok(self.chain_state.lock().unwrap().collateral_balance)
    }

    async fn read_loans(&self, _account: Address) -> Result<Vec<Loan>, ChainError> {
        self.check_reads()?;
        Ok(self.chain_state.lock().unwrap().loans.clone())
    }

    async fn read_token_balance(&self, holder: Address) -> Result<U256, ChainError> {
        self.check_reads()?;
        let state = self.chain_state.lock().unwrap();
        if holder == ACCOUNT {
            Ok(state.user_token_balance)
        } else {
            Ok(state.contract_token_balance)
        }
    }

    async fn submit(&self, call: ContractCall) -> Result<TxHandle, ChainError> {
        if let Some(store) = self.observer.lock().unwrap().as_ref() {
            self.loading_at_submit.lock().unwrap().push(store.is_loading());
        }

        let method = call.method_name();
        if let Some(error) = self.submit_failures.lock().unwrap().get(method) {
            return Err(error.clone());
        }

        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(call);
        let hash = B256::with_last_byte(submitted.len() as u8);
        Ok(TxHandle { hash })
    }

    async fn await_receipt(&self, handle: TxHandle) -> Result<Receipt, ChainError> {
        let position = handle.hash.0[31] as usize - 1;
        let method = self.submitted.lock().unwrap()[position].method_name();
        if let Some(error) = self.receipt_failures.lock().unwrap().get(method) {
            return Err(error.clone());
        }
        Ok(Receipt { transaction_hash: handle.hash, block_number: position as u64 + 1 })
    }
}
