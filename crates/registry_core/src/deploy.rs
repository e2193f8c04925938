//! Publishing contract variants: one routine for every contract, parameterized by
//! artifact and constructor arguments.

use std::str::FromStr;

use alloy_primitives::{Address, Bytes};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::domain::TransactionReceipt;
use tracing::info;

use crate::{
    rpc::{ReceiptPolling, RpcClient, TxOptions},
    RegistryError, WalletLayer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorArg {
    /// The address that sends the deployment.
    Deployer,
    Address(Address),
}

#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub contract_name: String,
    pub bytecode: Bytes,
    pub constructor_args: Vec<ConstructorArg>,
}

#[derive(Debug, Clone)]
pub struct Deployment {
    pub contract_name: String,
    pub address: Address,
    pub receipt: TransactionReceipt,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    #[serde(default)]
    contract_name: Option<String>,
    bytecode: String,
}

/// Accepts either a compiler artifact (JSON with a `bytecode` field) or bare hex.
/// Returns the contract name when the artifact carries one.
pub fn parse_artifact(raw: &str) -> Result<(Option<String>, Bytes)> {
    let raw = raw.trim();
    let (name, hex) = if raw.starts_with('{') {
        let artifact: Artifact = serde_json::from_str(raw).context("parsing contract artifact")?;
        (artifact.contract_name, artifact.bytecode)
    } else {
        (None, raw.to_string())
    };

    let bytecode = Bytes::from_str(hex.trim()).context("decoding contract bytecode")?;
    if bytecode.is_empty() {
        return Err(anyhow!("contract bytecode is empty"));
    }
    Ok((name, bytecode))
}

/// Creation payload: bytecode followed by each argument as one 32-byte word.
pub fn creation_data(bytecode: &Bytes, args: &[ConstructorArg], deployer: Address) -> Bytes {
    let mut data = bytecode.to_vec();
    for arg in args {
        let address = match arg {
            ConstructorArg::Deployer => deployer,
            ConstructorArg::Address(address) => *address,
        };
        data.extend_from_slice(address.into_word().as_slice());
    }
    Bytes::from(data)
}

pub async fn deploy_contract(
    rpc: &RpcClient,
    wallet: &dyn WalletLayer,
    tx_options: &TxOptions,
    polling: &ReceiptPolling,
    request: DeploymentRequest,
) -> Result<Deployment, RegistryError> {
    let deployer = crate::resolve_signer(wallet).await?;

    let data = creation_data(&request.bytecode, &request.constructor_args, deployer);
    let mut tx: Value = json!({ "from": deployer, "data": data });
    tx_options.apply(&mut tx);

    info!(contract = %request.contract_name, %deployer, "deploying contract");
    let hash = rpc
        .send_transaction(tx)
        .await
        .map_err(RegistryError::Submission)?;
    let receipt = rpc
        .wait_for_receipt(hash, polling)
        .await
        .map_err(RegistryError::Submission)?;

    if !receipt.succeeded {
        return Err(RegistryError::Submission(anyhow!(
            "deployment of {} reverted in {}",
            request.contract_name,
            receipt.transaction_hash
        )));
    }
    let address = receipt.contract_address.ok_or_else(|| {
        RegistryError::Submission(anyhow!(
            "receipt {} has no contract address",
            receipt.transaction_hash
        ))
    })?;

    info!(contract = %request.contract_name, %address, "contract deployed");
    Ok(Deployment {
        contract_name: request.contract_name,
        address,
        receipt,
    })
}

#[cfg(test)]
#[path = "tests/deploy_tests.rs"]
mod tests;
