pub mod client_trait;
pub mod rpc_utils;
