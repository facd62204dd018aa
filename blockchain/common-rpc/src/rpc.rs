use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Default timeout applied to every JSON-RPC request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Response { code: i64, message: String, data: Option<Value> },

    #[error("Response deserialization error: {0}")]
    DeserializationError(String),
}

/// Trait for converting RpcError to other error types
pub trait RpcErrorConverter<E> {
    /// Convert an RpcError to another error type
    fn convert_error(error: RpcError) -> E;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Minimal JSON-RPC 2.0 client over HTTP
///
/// Wallet providers and Ethereum nodes share this transport; the method names
/// and parameter shapes are the caller's concern.
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a new client for the given endpoint with the default timeout
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Self::new_with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a new client for the given endpoint and timeout
    pub fn new_with_timeout(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url: url.to_string(), next_id: AtomicU64::new(1) })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a request and deserialize its `result`
    ///
    /// A `null` result deserializes as-is, so methods that may return nothing
    /// should be requested as `Option<T>`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("JSON-RPC request {} #{} to {}", method, id, self.url);

        let request = JsonRpcRequest { jsonrpc: "2.0", id, method, params };
        let response: JsonRpcResponse =
            self.http.post(&self.url).json(&request).send().await?.json().await?;

        if let Some(error) = response.error {
            debug!("JSON-RPC {} #{} failed: {} ({})", method, id, error.message, error.code);
            return Err(RpcError::Response {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(|e| RpcError::DeserializationError(format!("{}: {}", method, e)))
    }

    /// Send a request with automatic error conversion
    pub async fn request_with_conversion<T, E, C>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, E>
    where
        T: DeserializeOwned,
        C: RpcErrorConverter<E>,
    {
        self.request(method, params).await.map_err(C::convert_error)
    }
}
