use crate::common::client_trait::{ChainClient, ContractCall, Receipt, TxHandle};
use crate::common::rpc_utils::ChainErrorConverter;
use crate::contracts::{balanceOfCall, getLoanStatusCall, loanAccountsCall};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::SolCall;
use common::network::get_network_by_chain_id;
use common::{ChainError, Connection, Loan};
use common_rpc::{JsonRpcClient, RpcError, RpcErrorConverter};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Default interval between `eth_getTransactionReceipt` polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    // absent on pre-byzantium chains, treated as success
    status: Option<U64>,
}

/// `ChainClient` backed by an EIP-1193 style JSON-RPC wallet provider
pub struct EvmClient {
    provider: Option<JsonRpcClient>,
    connection: RwLock<Option<Connection>>,
    poll_interval: Duration,
}

impl EvmClient {
    /// Creates a client for the provider at `provider_url`.
    ///
    /// `None` models a browser without an injected wallet: construction succeeds
    /// and every connect attempt reports `WalletUnavailable`.
    pub fn new(provider_url: Option<&str>) -> Result<Self, ChainError> {
        let provider = provider_url
            .map(JsonRpcClient::new)
            .transpose()
            .map_err(ChainErrorConverter::convert_error)?;

        Ok(Self { provider, connection: RwLock::new(None), poll_interval: DEFAULT_POLL_INTERVAL })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The connection established by the last successful `connect`
    pub fn connection(&self) -> Option<Connection> {
        *self.connection.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn provider(&self) -> Result<&JsonRpcClient, ChainError> {
        self.provider.as_ref().ok_or(ChainError::WalletUnavailable)
    }

    fn connected(&self) -> Result<Connection, ChainError> {
        self.connection().ok_or(ChainError::NotConnected)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainError> {
        self.provider()?
            .request_with_conversion::<T, ChainError, ChainErrorConverter>(method, params)
            .await
    }

    async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, ChainError> {
        let connection = self.connected()?;
        let params = json!([
            { "from": connection.account, "to": to, "data": Bytes::from(data) },
            "latest"
        ]);
        self.request("eth_call", params).await
    }
}

fn decode_error(method: &str, error: alloy_sol_types::Error) -> ChainError {
    ChainError::Rpc(format!("Failed to decode {} result: {}", method, error))
}

impl ChainClient for EvmClient {
    async fn connect(&self) -> Result<Connection, ChainError> {
        let provider = self.provider()?;

        let accounts: Vec<Address> = provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| match e {
                // an endpoint nobody is listening on is the same as no wallet at all
                RpcError::Transport(ref transport) if transport.is_connect() => {
                    ChainError::WalletUnavailable
                }
                other => ChainErrorConverter::convert_error(other),
            })?;
        let account = accounts.first().copied().ok_or(ChainError::UserRejected)?;

        let chain_id: U64 = self.request("eth_chainId", json!([])).await?;
        let chain_id = chain_id.to::<u64>();
        let network =
            get_network_by_chain_id(chain_id).ok_or(ChainError::UnsupportedNetwork(chain_id))?;

        let connection = Connection { account, network };
        *self.connection.write().unwrap_or_else(PoisonError::into_inner) = Some(connection);
        info!("Connected {} on {} (chain id {})", account, network.name, chain_id);

        Ok(connection)
    }

    async fn read_collateral(&self, account: Address) -> Result<U256, ChainError> {
        let lending = self.connected()?.network.addresses.lending_contract;
        let data = self.eth_call(lending, loanAccountsCall { account }.abi_encode()).await?;
        let decoded = loanAccountsCall::abi_decode_returns(&data, true)
            .map_err(|e| decode_error("loanAccounts", e))?;
        Ok(decoded.collateral)
    }

    async fn read_loans(&self, account: Address) -> Result<Vec<Loan>, ChainError> {
        let lending = self.connected()?.network.addresses.lending_contract;
        let data = self.eth_call(lending, getLoanStatusCall { account }.abi_encode()).await?;
        let decoded = getLoanStatusCall::abi_decode_returns(&data, true)
            .map_err(|e| decode_error("getLoanStatus", e))?;
        Ok(decoded.loans.into_iter().map(Loan::from).collect())
    }

    async fn read_token_balance(&self, holder: Address) -> Result<U256, ChainError> {
        let token = self.connected()?.network.addresses.token_contract;
        let data = self.eth_call(token, balanceOfCall { account: holder }.abi_encode()).await?;
        let decoded = balanceOfCall::abi_decode_returns(&data, true)
            .map_err(|e| decode_error("balanceOf", e))?;
        Ok(decoded.balance)
    }

    async fn submit(&self, call: ContractCall) -> Result<TxHandle, ChainError> {
        let connection = self.connected()?;
        let encoded = call.encode(&connection.network.addresses);

        let mut transaction = json!({
            "from": connection.account,
            "to": encoded.to,
            "data": Bytes::from(encoded.data),
        });
        if !encoded.value.is_zero() {
            transaction["value"] = json!(encoded.value);
        }

        let hash: B256 = self.request("eth_sendTransaction", json!([transaction])).await?;
        debug!("Submitted {} as {}", call.method_name(), hash);
        Ok(TxHandle { hash })
    }

    async fn await_receipt(&self, handle: TxHandle) -> Result<Receipt, ChainError> {
        loop {
            let receipt: Option<RawReceipt> =
                self.request("eth_getTransactionReceipt", json!([handle.hash])).await?;

            match receipt {
                Some(RawReceipt { block_number: Some(block_number), status, transaction_hash }) => {
                    if status.is_some_and(|status| status.is_zero()) {
                        return Err(ChainError::Reverted { reason: None });
                    }
                    let block_number = block_number.to::<u64>();
                    debug!("Transaction {} mined in block {}", transaction_hash, block_number);
                    return Ok(Receipt { transaction_hash, block_number });
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::LoanStatus;
    use alloy_primitives::address;
    use alloy_sol_types::{Revert, SolError};
    use axum::{extract::State, routing::post, Json, Router};
    use common::network::{LOCALHOST_CHAIN_ID, SEPOLIA_CHAIN_ID};
    use std::str::FromStr;
    use std::sync::{Arc, Mutex};

    const ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const TX_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    #[derive(Default)]
    struct StubNode {
        chain_id: u64,
        reject_accounts: bool,
        revert_reason: Option<String>,
        receipt_status: u64,
        // receipts are reported missing this many times before appearing
        pending_polls: Mutex<u32>,
        requests: Mutex<Vec<Value>>,
    }

    impl StubNode {
        fn requests(&self, method: &str) -> Vec<Value> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|request| request["method"] == method)
                .cloned()
                .collect()
        }
    }

    fn ok(id: &Value, result: Value) -> Json<Value> {
        Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }

    fn err(id: &Value, code: i64, message: &str, data: Value) -> Json<Value> {
        Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message, "data": data }
        }))
    }

    fn answer_call(data: &[u8]) -> Value {
        let encoded = if data.starts_with(&loanAccountsCall::SELECTOR) {
            loanAccountsCall::abi_encode_returns(&(U256::from(2_000_000_000_000_000_000u64),))
        } else if data.starts_with(&getLoanStatusCall::SELECTOR) {
            let loans = vec![
                LoanStatus { principal: U256::from(100u64), interest: U256::from(1u64) },
                LoanStatus { principal: U256::from(200u64), interest: U256::from(2u64) },
            ];
            getLoanStatusCall::abi_encode_returns(&(loans,))
        } else {
            let holder = balanceOfCall::abi_decode(data, true).unwrap().account;
            let balance = if holder == ACCOUNT { 50u64 } else { 7u64 };
            balanceOfCall::abi_encode_returns(&(U256::from(balance),))
        };
        json!(Bytes::from(encoded))
    }

    async fn handle(State(node): State<Arc<StubNode>>, Json(body): Json<Value>) -> Json<Value> {
        node.requests.lock().unwrap().push(body.clone());
        let id = &body["id"];

        match body["method"].as_str().unwrap_or_default() {
            "eth_requestAccounts" if node.reject_accounts => {
                err(id, 4001, "User rejected the request.", Value::Null)
            }
            "eth_requestAccounts" => ok(id, json!([ACCOUNT])),
            "eth_chainId" => ok(id, json!(format!("0x{:x}", node.chain_id))),
            "eth_call" => {
                let data = Bytes::from_str(body["params"][0]["data"].as_str().unwrap()).unwrap();
                ok(id, answer_call(&data))
            }
            "eth_sendTransaction" => match &node.revert_reason {
                Some(reason) => {
                    let data = Revert { reason: reason.clone() }.abi_encode();
                    err(id, 3, "execution reverted", json!(Bytes::from(data)))
                }
                None => ok(id, json!(TX_HASH)),
            },
            "eth_getTransactionReceipt" => {
                let mut pending = node.pending_polls.lock().unwrap();
                if *pending > 0 {
                    *pending -= 1;
                    return ok(id, Value::Null);
                }
                ok(
                    id,
                    json!({
                        "transactionHash": TX_HASH,
                        "blockNumber": "0x2a",
                        "status": format!("0x{:x}", node.receipt_status),
                    }),
                )
            }
            _ => err(id, -32601, "Method not found", Value::Null),
        }
    }

    async fn spawn_node(node: StubNode) -> (Arc<StubNode>, EvmClient) {
        let node = Arc::new(node);
        let app = Router::new().route("/", post(handle)).with_state(node.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client =
            EvmClient::new(Some(&url)).unwrap().with_poll_interval(Duration::from_millis(10));
        (node, client)
    }

    fn localhost() -> StubNode {
        StubNode { chain_id: LOCALHOST_CHAIN_ID, receipt_status: 1, ..Default::default() }
    }

    #[tokio::test]
    async fn test_connect_without_provider() {
        let client = EvmClient::new(None).unwrap();
        assert_eq!(client.connect().await.unwrap_err(), ChainError::WalletUnavailable);
        assert!(client.connection().is_none());
    }

    #[tokio::test]
    async fn test_connect_refused_means_no_wallet() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = EvmClient::new(Some(&format!("http://{}", addr))).unwrap();
        assert_eq!(client.connect().await.unwrap_err(), ChainError::WalletUnavailable);
        assert!(client.connection().is_none());
    }

    #[tokio::test]
    async fn test_connect_resolves_network() {
        let (_node, client) = spawn_node(localhost()).await;
        let connection = client.connect().await.unwrap();
        assert_eq!(connection.account, ACCOUNT);
        assert_eq!(connection.network.chain_id, LOCALHOST_CHAIN_ID);
        assert_eq!(client.connection(), Some(connection));

        let (_node, client) =
            spawn_node(StubNode { chain_id: SEPOLIA_CHAIN_ID, ..Default::default() }).await;
        assert_eq!(client.connect().await.unwrap().network.name, "Sepolia");
    }

    #[tokio::test]
    async fn test_connect_unknown_chain() {
        let (_node, client) = spawn_node(StubNode { chain_id: 1, ..Default::default() }).await;
        assert_eq!(client.connect().await.unwrap_err(), ChainError::UnsupportedNetwork(1));
        assert!(client.connection().is_none());
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let (_node, client) =
            spawn_node(StubNode { reject_accounts: true, ..localhost() }).await;
        assert_eq!(client.connect().await.unwrap_err(), ChainError::UserRejected);
    }

    #[tokio::test]
    async fn test_reads_require_connection() {
        let (node, client) = spawn_node(localhost()).await;
        assert_eq!(client.read_collateral(ACCOUNT).await.unwrap_err(), ChainError::NotConnected);
        assert!(node.requests("eth_call").is_empty());
    }

    #[tokio::test]
    async fn test_reads() {
        let (node, client) = spawn_node(localhost()).await;
        let connection = client.connect().await.unwrap();

        assert_eq!(
            client.read_collateral(ACCOUNT).await.unwrap(),
            U256::from(2_000_000_000_000_000_000u64)
        );

        let loans = client.read_loans(ACCOUNT).await.unwrap();
        assert_eq!(loans.len(), 2);
        assert_eq!(loans[1], Loan { principal: U256::from(200u64), interest: U256::from(2u64) });

        assert_eq!(client.read_token_balance(ACCOUNT).await.unwrap(), U256::from(50u64));
        let lending = connection.network.addresses.lending_contract;
        assert_eq!(client.read_token_balance(lending).await.unwrap(), U256::from(7u64));

        let calls = node.requests("eth_call");
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0]["params"][0]["to"], json!(lending));
        assert_eq!(calls[2]["params"][0]["to"], json!(connection.network.addresses.token_contract));
        assert_eq!(calls[0]["params"][1], "latest");
    }

    #[tokio::test]
    async fn test_submit_and_await() {
        let (node, client) =
            spawn_node(StubNode { pending_polls: Mutex::new(2), ..localhost() }).await;
        let connection = client.connect().await.unwrap();

        let value = U256::from(1_500_000_000_000_000_000u64);
        let handle = client.submit(ContractCall::DepositCollateral { value }).await.unwrap();
        assert_eq!(handle.hash, B256::from_str(TX_HASH).unwrap());

        let sent = node.requests("eth_sendTransaction");
        assert_eq!(sent.len(), 1);
        let transaction = &sent[0]["params"][0];
        assert_eq!(transaction["from"], json!(ACCOUNT));
        assert_eq!(transaction["to"], json!(connection.network.addresses.lending_contract));
        assert_eq!(transaction["value"], json!(value));

        let receipt = client.await_receipt(handle).await.unwrap();
        assert_eq!(receipt.block_number, 42);
        assert_eq!(node.requests("eth_getTransactionReceipt").len(), 3);
    }

    #[tokio::test]
    async fn test_non_payable_submit_omits_value() {
        let (node, client) = spawn_node(localhost()).await;
        client.connect().await.unwrap();
        client.submit(ContractCall::BorrowStableCoin { amount: U256::from(1u64) }).await.unwrap();

        let sent = node.requests("eth_sendTransaction");
        assert!(sent[0]["params"][0].get("value").is_none());
    }

    #[tokio::test]
    async fn test_submit_reverted_with_reason() {
        let (_node, client) = spawn_node(StubNode {
            revert_reason: Some("Insufficient collateral".into()),
            ..localhost()
        })
        .await;
        client.connect().await.unwrap();

        let err = client
            .submit(ContractCall::BorrowStableCoin { amount: U256::from(1u64) })
            .await
            .unwrap_err();
        assert_eq!(err.revert_reason(), Some("Insufficient collateral"));
    }

    #[tokio::test]
    async fn test_failed_receipt() {
        let (_node, client) = spawn_node(StubNode { receipt_status: 0, ..localhost() }).await;
        client.connect().await.unwrap();

        let handle =
            client.submit(ContractCall::Liquidate { borrower: ACCOUNT }).await.unwrap();
        assert_eq!(
            client.await_receipt(handle).await.unwrap_err(),
            ChainError::Reverted { reason: None }
        );
    }
}
