//! Ethereum JSON-RPC client for block, transaction and contract reads.

use std::time::Duration;

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::primitives::{Bytes, B256};
use alloy::rpc::types::BlockNumberOrTag;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tx_explorer_telemetry::Metrics;

use crate::contract::ContractHandle;
use crate::error::{ChainError, ChainResult};
use crate::reader::ChainReader;
use crate::types::{Block, Transaction};

/// Default per-call transport timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Ethereum JSON-RPC client wrapper.
pub struct ChainClient {
    client: Client,
    rpc_url: Url,
    metrics: Metrics,
    probed_block: Option<u64>,
}

impl ChainClient {
    /// Connect to a node and probe it.
    ///
    /// The probe fetches the latest block number and logs whether the node
    /// answered; an unanswered probe does not fail the connection.
    ///
    /// # Arguments
    /// * `rpc_url` - HTTP/HTTPS JSON-RPC endpoint URL
    /// * `timeout` - Per-call transport timeout
    /// * `metrics` - Metrics collector
    pub async fn connect(rpc_url: &str, timeout: Duration, metrics: Metrics) -> ChainResult<Self> {
        let mut client = Self::new(rpc_url, timeout, metrics)?;

        match client.latest_block_number().await {
            Ok(latest) => {
                info!(latest_block = latest, "ETH node connection ok");
                client.probed_block = Some(latest);
            }
            Err(e) => warn!("ETH node at {} did not answer the liveness probe: {}", client.host(), e),
        }

        Ok(client)
    }

    /// Build a client without probing the node.
    pub fn new(rpc_url: &str, timeout: Duration, metrics: Metrics) -> ChainResult<Self> {
        let connection_error = |reason: String| ChainError::Connection {
            endpoint: rpc_url.to_string(),
            reason,
        };

        let url = Url::parse(rpc_url).map_err(|e| connection_error(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(connection_error(format!("unsupported scheme {}", url.scheme())));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| connection_error(e.to_string()))?;

        Ok(Self {
            client,
            rpc_url: url,
            metrics,
            probed_block: None,
        })
    }

    /// Whether the liveness probe at connect time succeeded.
    pub fn is_connected(&self) -> bool {
        self.probed_block.is_some()
    }

    /// Latest block number observed by the liveness probe.
    pub fn probed_block(&self) -> Option<u64> {
        self.probed_block
    }

    // Endpoint URLs usually embed an API key; only the host is ever logged.
    fn host(&self) -> &str {
        self.rpc_url.host_str().unwrap_or("<unknown>")
    }

    async fn call_rpc(&self, method: &str, params: Value) -> ChainResult<Value> {
        let start = Instant::now();
        let result = self.send(method, params).await;
        self.metrics
            .observe_rpc_latency(method, start.elapsed().as_secs_f64());
        if result.is_err() {
            self.metrics.inc_rpc_errors(method);
        }
        result
    }

    async fn send(&self, method: &str, params: Value) -> ChainResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self
            .client
            .post(self.rpc_url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(ChainError::Rpc(format!(
                "{} failed with status: {}",
                method,
                response.status()
            )));
        }

        let mut result: Value = response
            .json()
            .await
            .map_err(|e| ChainError::Rpc(format!("{} returned an invalid body: {}", method, e)))?;

        if let Some(error) = result.get("error") {
            return Err(ChainError::Rpc(format!("{}: {}", method, error)));
        }

        Ok(result["result"].take())
    }

    fn transport_error(&self, error: reqwest::Error) -> ChainError {
        let is_connect = error.is_connect();
        let reason = error.without_url().to_string();
        if is_connect {
            ChainError::Connection {
                endpoint: self.host().to_string(),
                reason,
            }
        } else {
            ChainError::Rpc(reason)
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        missing: impl FnOnce() -> String,
    ) -> ChainResult<T> {
        let result = self.call_rpc(method, params).await?;
        if result.is_null() {
            return Err(ChainError::NotFound(missing()));
        }
        serde_json::from_value(result)
            .map_err(|e| ChainError::Rpc(format!("{} returned an unexpected shape: {}", method, e)))
    }
}

#[async_trait]
impl ChainReader for ChainClient {
    async fn latest_block_number(&self) -> ChainResult<u64> {
        let result = self.call_rpc("eth_blockNumber", json!([])).await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| ChainError::Rpc("eth_blockNumber returned a non-string".to_string()))?;
        let block_num = u64::from_str_radix(hex_str.strip_prefix("0x").unwrap_or(hex_str), 16)
            .map_err(|e| ChainError::Rpc(format!("invalid block number {}: {}", hex_str, e)))?;
        debug!("Latest block number: {}", block_num);
        Ok(block_num)
    }

    async fn get_block(&self, block: BlockNumberOrTag) -> ChainResult<Block> {
        // Hashes only; transactions are fetched one by one by the caller.
        let block_data: Block = self
            .fetch("eth_getBlockByNumber", json!([block, false]), || format!("Block {}", block))
            .await?;
        debug!(
            "Fetched block {} with {} transactions",
            block,
            block_data.transactions.len()
        );
        Ok(block_data)
    }

    async fn get_transaction(&self, hash: B256) -> ChainResult<Transaction> {
        let tx: Transaction = self
            .fetch("eth_getTransactionByHash", json!([hash]), || format!("Transaction {}", hash))
            .await?;
        debug!("Fetched transaction {}", hash);
        Ok(tx)
    }

    async fn call_function(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[DynSolValue],
    ) -> ChainResult<Vec<DynSolValue>> {
        let abi_function = contract.function(function, args.len())?;
        let data = abi_function
            .abi_encode_input(args)
            .map_err(|e| ChainError::Abi(format!("cannot encode {}: {}", function, e)))?;

        let call = json!({
            "to": contract.address(),
            "data": Bytes::from(data),
        });
        let result = self.call_rpc("eth_call", json!([call, "latest"])).await?;
        let output: Bytes = serde_json::from_value(result)
            .map_err(|e| ChainError::Rpc(format!("eth_call returned an invalid payload: {}", e)))?;

        let values = abi_function.abi_decode_output(&output, true).map_err(|e| {
            ChainError::Abi(format!(
                "cannot decode {}.{} output: {}",
                contract.label(),
                function,
                e
            ))
        })?;
        debug!("Called {}.{} on {}", contract.label(), function, contract.address());
        Ok(values)
    }
}
