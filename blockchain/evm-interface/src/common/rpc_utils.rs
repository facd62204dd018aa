use alloy_primitives::Bytes;
use alloy_sol_types::{Revert, SolError};
use common::ChainError;
use common_rpc::{RpcError, RpcErrorConverter};
use serde_json::Value;
use std::str::FromStr;

/// EIP-1193 "User Rejected Request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// Code geth and most providers attach to `execution reverted` errors
pub const EXECUTION_REVERTED_CODE: i64 = 3;

/// Centralized error converter for wallet and node errors
pub struct ChainErrorConverter;

impl RpcErrorConverter<ChainError> for ChainErrorConverter {
    fn convert_error(error: RpcError) -> ChainError {
        match error {
            RpcError::Response { code, message, data } => {
                // wallets wrap the node's error object inside `data`, sometimes twice
                let nested = data.as_ref().map(nested_errors).unwrap_or_default();
                let codes = || std::iter::once(Some(code)).chain(nested.iter().map(|(c, _)| *c));
                let messages =
                    || std::iter::once(message.as_str()).chain(nested.iter().map(|(_, m)| *m));

                if codes().any(|c| c == Some(USER_REJECTED_CODE)) {
                    return ChainError::UserRejected;
                }

                if let Some(reason) = data.as_ref().and_then(decode_revert_data) {
                    return ChainError::Reverted { reason: Some(reason) };
                }

                if codes().any(|c| c == Some(EXECUTION_REVERTED_CODE))
                    || messages().any(|m| m.contains("revert"))
                {
                    let reason = messages().find_map(extract_revert_reason);
                    return ChainError::Reverted { reason };
                }

                ChainError::Rpc(message)
            }
            RpcError::Transport(e) => ChainError::Rpc(e.to_string()),
            RpcError::DeserializationError(e) => ChainError::Rpc(e),
        }
    }
}

// (code, message) of each error object found by following `data` keys
fn nested_errors(data: &Value) -> Vec<(Option<i64>, &str)> {
    let mut errors = Vec::new();
    let mut current = data;
    while let Value::Object(fields) = current {
        let code = fields.get("code").and_then(Value::as_i64);
        let message = fields.get("message").and_then(Value::as_str).unwrap_or_default();
        errors.push((code, message));
        match fields.get("data") {
            Some(next) => current = next,
            None => break,
        }
    }
    errors
}

/// Decodes a standard `Error(string)` payload from a JSON-RPC error's `data`.
///
/// Providers disagree on the shape: some send the hex string directly, others
/// nest it under one or more `data` keys.
pub fn decode_revert_data(data: &Value) -> Option<String> {
    match data {
        Value::String(hex) => {
            let bytes = Bytes::from_str(hex).ok()?;
            Revert::abi_decode(&bytes, true).ok().map(|revert| revert.reason)
        }
        Value::Object(fields) => decode_revert_data(fields.get("data")?),
        _ => None,
    }
}

/// Pulls a human-readable revert reason out of a provider error message.
///
/// Recognizes hardhat's `reverted with reason string '...'`, geth's
/// `execution reverted: ...`, and otherwise falls back to the first
/// double-quoted substring.
pub fn extract_revert_reason(message: &str) -> Option<String> {
    const HARDHAT_MARKER: &str = "reverted with reason string '";
    const GETH_MARKER: &str = "execution reverted: ";

    if let Some(start) = message.find(HARDHAT_MARKER) {
        let rest = &message[start + HARDHAT_MARKER.len()..];
        if let Some(end) = rest.find('\'') {
            return non_empty(&rest[..end]);
        }
    }

    if let Some(start) = message.find(GETH_MARKER) {
        return non_empty(message[start + GETH_MARKER.len()..].trim());
    }

    let start = message.find('"')?;
    let rest = &message[start + 1..];
    let end = rest.find('"')?;
    non_empty(&rest[..end])
}

fn non_empty(reason: &str) -> Option<String> {
    if reason.is_empty() {
        None
    } else {
        Some(reason.to_string())
    }
}
