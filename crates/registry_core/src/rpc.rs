//! JSON-RPC backed ledger and wallet for Ethereum-compatible nodes.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_primitives::{Address, Bytes, B256, U128, U256, U64};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use shared::domain::{ContractDraft, ContractRecord, PendingTransaction, TransactionReceipt};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::{abi, LedgerCollection, WalletLayer};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("malformed rpc response to {method}: {detail}")]
    Malformed { method: String, detail: String },
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

pub struct RpcClient {
    http: Client,
    url: Url,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: Url) -> Self {
        Self {
            http: Client::new(),
            url,
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, "rpc request");

        let response: RpcResponse = self
            .http
            .post(self.url.clone())
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null)).map_err(|err| {
            RpcError::Malformed {
                method: method.to_string(),
                detail: err.to_string(),
            }
        })
    }

    pub async fn call(&self, to: Address, data: Vec<u8>) -> Result<Bytes> {
        let params = json!([{ "to": to, "data": Bytes::from(data) }, "latest"]);
        Ok(self.request("eth_call", params).await?)
    }

    pub async fn send_transaction(&self, tx: Value) -> Result<B256> {
        Ok(self.request("eth_sendTransaction", json!([tx])).await?)
    }

    /// Polls until the node reports a receipt for `hash` or `polling.timeout` elapses.
    pub async fn wait_for_receipt(
        &self,
        hash: B256,
        polling: &ReceiptPolling,
    ) -> Result<TransactionReceipt> {
        let deadline = Instant::now() + polling.timeout;
        loop {
            let receipt: Option<RpcReceipt> = self
                .request("eth_getTransactionReceipt", json!([hash]))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(receipt.into());
            }
            if Instant::now() >= deadline {
                bail!(
                    "no receipt for transaction {hash} after {:?}",
                    polling.timeout
                );
            }
            tokio::time::sleep(polling.interval).await;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<U64>,
    gas_used: U64,
    #[serde(default)]
    status: Option<U64>,
    #[serde(default)]
    contract_address: Option<Address>,
}

impl From<RpcReceipt> for TransactionReceipt {
    fn from(value: RpcReceipt) -> Self {
        Self {
            transaction_hash: value.transaction_hash,
            block_number: value.block_number.map(|n| n.to::<u64>()),
            gas_used: value.gas_used.to::<u64>(),
            // Receipts without a status field predate revert reporting.
            succeeded: value.status.map_or(true, |status| status == U64::from(1)),
            contract_address: value.contract_address,
        }
    }
}

/// Optional overrides applied to every outgoing transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub chain_id: Option<u64>,
    pub gas_limit: Option<u64>,
    pub gas_price_wei: Option<u128>,
}

impl TxOptions {
    pub fn apply(&self, tx: &mut Value) {
        if let Some(chain_id) = self.chain_id {
            tx["chainId"] = json!(U64::from(chain_id));
        }
        if let Some(gas) = self.gas_limit {
            tx["gas"] = json!(U64::from(gas));
        }
        if let Some(price) = self.gas_price_wei {
            tx["gasPrice"] = json!(U128::from(price));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptPolling {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

pub struct RpcLedger {
    rpc: Arc<RpcClient>,
    contract: Address,
    tx_options: TxOptions,
    polling: ReceiptPolling,
}

impl RpcLedger {
    pub fn new(
        rpc: Arc<RpcClient>,
        contract: Address,
        tx_options: TxOptions,
        polling: ReceiptPolling,
    ) -> Self {
        Self {
            rpc,
            contract,
            tx_options,
            polling,
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Reads any zero-argument `uint256` view function of the registry contract.
    pub async fn read_scalar(&self, function_name: &str) -> Result<U256> {
        let raw = self
            .rpc
            .call(self.contract, abi::view_calldata(function_name))
            .await?;
        abi::decode_uint(&raw).with_context(|| format!("decoding {function_name}() result"))
    }
}

#[async_trait]
impl LedgerCollection for RpcLedger {
    async fn size(&self) -> Result<u64> {
        let raw = self
            .rpc
            .call(self.contract, abi::total_contracts_calldata())
            .await?;
        let total = abi::decode_uint(&raw).context("decoding totalContracts() result")?;
        u64::try_from(total).map_err(|_| anyhow!("registry size {total} does not fit in u64"))
    }

    async fn get(&self, index: u64) -> Result<ContractRecord> {
        let raw = self
            .rpc
            .call(self.contract, abi::contract_at_calldata(index))
            .await?;
        abi::decode_record(&raw).with_context(|| format!("decoding contracts({index}) result"))
    }

    async fn create(&self, from: Address, draft: &ContractDraft) -> Result<PendingTransaction> {
        let mut tx = json!({
            "from": from,
            "to": self.contract,
            "data": Bytes::from(abi::create_contract_calldata(draft)),
        });
        self.tx_options.apply(&mut tx);
        let hash = self.rpc.send_transaction(tx).await?;
        Ok(PendingTransaction { hash })
    }

    async fn wait(&self, pending: &PendingTransaction) -> Result<TransactionReceipt> {
        self.rpc.wait_for_receipt(pending.hash, &self.polling).await
    }
}

/// Wallet backed by the node's account management.
///
/// With `request_access` set, `eth_requestAccounts` is tried first; a refusal is
/// logged and the plain `eth_accounts` answer decides.
pub struct RpcWallet {
    rpc: Arc<RpcClient>,
    request_access: bool,
}

impl RpcWallet {
    pub fn new(rpc: Arc<RpcClient>, request_access: bool) -> Self {
        Self {
            rpc,
            request_access,
        }
    }
}

#[async_trait]
impl WalletLayer for RpcWallet {
    async fn active_identity(&self) -> Result<Option<Address>> {
        if self.request_access {
            match self
                .rpc
                .request::<Vec<Address>>("eth_requestAccounts", json!([]))
                .await
            {
                Ok(accounts) if !accounts.is_empty() => return Ok(accounts.first().copied()),
                Ok(_) => {}
                Err(err) => warn!("account access request failed: {err}"),
            }
        }

        let accounts: Vec<Address> = self.rpc.request("eth_accounts", json!([])).await?;
        Ok(accounts.into_iter().next())
    }
}

#[cfg(test)]
#[path = "tests/rpc_tests.rs"]
mod tests;
