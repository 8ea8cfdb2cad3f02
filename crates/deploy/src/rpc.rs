//! Ethereum JSON-RPC access used by the deployment workflow.
//!
//! [`EthRpc`] is the narrow set of node calls the workflow needs. [`HttpRpc`] is the
//! production implementation over HTTP.

use std::{future::Future, time::Duration};

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::Context;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::error::{DeployError, Result};

/// Default timeout for RPC requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A transaction submitted through `eth_sendTransaction`.
///
/// The node signs it with one of its unlocked accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: Address,
    /// `None` for contract creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub data: Bytes,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_option_u64_as_hex"
    )]
    pub gas: Option<u64>,
}

impl TransactionRequest {
    /// A contract creation transaction carrying `init_code`.
    pub fn create(from: Address, init_code: Bytes) -> Self {
        Self {
            from,
            to: None,
            data: init_code,
            gas: None,
        }
    }

    /// A message call to `to`.
    pub fn call(from: Address, to: Address, data: Bytes) -> Self {
        Self {
            from,
            to: Some(to),
            data,
            gas: None,
        }
    }

    pub fn gas(mut self, gas: Option<u64>) -> Self {
        self.gas = gas;
        self
    }
}

/// The subset of a transaction receipt the workflow inspects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default, deserialize_with = "deserialize_option_u64_from_hex")]
    pub status: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_option_u64_from_hex")]
    pub block_number: Option<u64>,
}

impl TransactionReceipt {
    /// Pre-byzantium receipts carry no status and are treated as successful.
    pub fn is_success(&self) -> bool {
        self.status.is_none_or(|status| status == 1)
    }
}

fn serialize_option_u64_as_hex<S>(value: &Option<u64>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(v) => serializer.serialize_str(&format!("0x{v:x}")),
        None => serializer.serialize_none(),
    }
}

/// Deserialize an optional u64 from a hex quantity (with 0x prefix).
fn deserialize_option_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    s.map(|s| parse_quantity(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Parse a JSON-RPC hex quantity such as `0x1a`.
pub fn parse_quantity(s: &str) -> std::result::Result<u64, std::num::ParseIntError> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
}

/// Node calls needed to deploy and inspect the factory.
pub trait EthRpc: Send + Sync {
    /// `eth_chainId`.
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    /// `eth_accounts`: the accounts the node can sign for.
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>>> + Send;

    /// `eth_sendTransaction`, returning the transaction hash.
    ///
    /// A node refusing the transaction is a deployment error. Failing to reach the node
    /// stays a network error.
    fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> impl Future<Output = Result<B256>> + Send;

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    fn transaction_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<Option<TransactionReceipt>>> + Send;

    /// `eth_getCode` at the latest block.
    fn code_at(&self, address: Address) -> impl Future<Output = Result<Bytes>> + Send;

    /// `eth_call` at the latest block.
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = Result<Bytes>> + Send;
}

/// [`EthRpc`] over HTTP JSON-RPC.
#[derive(Debug, Clone)]
pub struct HttpRpc {
    client: reqwest::Client,
    url: Url,
}

impl HttpRpc {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = create_client(timeout).map_err(DeployError::configuration)?;
        Ok(Self { client, url })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        tracing::trace!(method, url = %self.url, "JSON-RPC request");
        json_rpc_call(&self.client, self.url.as_str(), method, params)
            .await
            .map_err(DeployError::network)
    }
}

impl EthRpc for HttpRpc {
    async fn chain_id(&self) -> Result<u64> {
        let id: String = self.request("eth_chainId", vec![]).await?;
        parse_quantity(&id)
            .map_err(|e| DeployError::Network(format!("Invalid eth_chainId result '{id}': {e}")))
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", vec![]).await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        tracing::trace!(url = %self.url, "JSON-RPC request eth_sendTransaction");
        json_rpc_call(
            &self.client,
            self.url.as_str(),
            "eth_sendTransaction",
            vec![serde_json::json!(tx)],
        )
        .await
        .map_err(classify_send_error)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", vec![serde_json::json!(hash)])
            .await
    }

    async fn code_at(&self, address: Address) -> Result<Bytes> {
        self.request(
            "eth_getCode",
            vec![serde_json::json!(address), serde_json::json!("latest")],
        )
        .await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request(
            "eth_call",
            vec![
                serde_json::json!({ "to": to, "data": data }),
                serde_json::json!("latest"),
            ],
        )
        .await
    }
}

/// An `error` object returned by the node in a JSON-RPC response.
#[derive(Debug, thiserror::Error)]
#[error("{method} RPC error: {message}")]
pub struct RpcErrorResponse {
    pub method: String,
    pub message: String,
}

/// Error responses to `eth_sendTransaction` reject the transaction; anything else is transport.
fn classify_send_error(err: anyhow::Error) -> DeployError {
    match err.downcast_ref::<RpcErrorResponse>() {
        Some(response) => DeployError::Deployment(response.to_string()),
        None => DeployError::network(err),
    }
}

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    parse_response(method, result)
}

/// Extract the `result` of a JSON-RPC response body, surfacing `error` objects.
fn parse_response<T: DeserializeOwned>(method: &str, response: Value) -> Result<T, anyhow::Error> {
    if let Some(error) = response.get("error") {
        return Err(RpcErrorResponse {
            method: method.to_string(),
            message: error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
                .to_string(),
        }
        .into());
    }

    let result_value = response
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// How long to wait for a transaction to be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPolicy {
    /// Maximum time to wait for a receipt, in seconds.
    pub timeout_secs: u64,
    /// Interval between receipt polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            poll_interval_ms: 1_000,
        }
    }
}

impl ConfirmationPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll `eth_getTransactionReceipt` until the transaction is mined.
///
/// RPC failures while polling are returned immediately; only a pending
/// transaction is waited on. Exceeding the policy timeout is a deployment error.
pub async fn wait_for_receipt<C: EthRpc>(
    client: &C,
    tx_hash: B256,
    policy: ConfirmationPolicy,
) -> Result<TransactionReceipt> {
    let start = std::time::Instant::now();

    loop {
        if let Some(receipt) = client.transaction_receipt(tx_hash).await? {
            tracing::debug!(
                tx_hash = %tx_hash,
                block_number = ?receipt.block_number,
                status = ?receipt.status,
                "Transaction mined"
            );
            return Ok(receipt);
        }

        if start.elapsed() > policy.timeout() {
            return Err(DeployError::Deployment(format!(
                "Timeout waiting for transaction {} to be mined after {}s",
                tx_hash, policy.timeout_secs
            )));
        }

        tracing::trace!(tx_hash = %tx_hash, "Transaction pending, polling again...");
        tokio::time::sleep(policy.poll_interval()).await;
    }
}
