pub mod client;
pub mod common;
pub mod contracts;

pub use client::EvmClient;
pub use crate::common::client_trait::{ChainClient, ContractCall, Receipt, TxHandle};
