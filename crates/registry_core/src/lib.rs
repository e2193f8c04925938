//! Registry synchronization and contract submission against an on-chain
//! forward swap registry.
//!
//! The ledger and the wallet are injected as [`LedgerCollection`] and
//! [`WalletLayer`] trait objects; [`rpc`] provides JSON-RPC backed
//! implementations of both.

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{ContractDraft, ContractRecord, PendingTransaction, TransactionReceipt};
use tracing::warn;

pub mod abi;
pub mod deploy;
pub mod error;
mod pipeline;
mod reader;
pub mod rpc;
mod service;

pub use error::RegistryError;
pub use pipeline::SubmissionPipeline;
pub use reader::RegistryReader;
pub use service::{RegistryEvent, RegistryService, SubmissionOutcome};

/// The authoritative collection of contract records.
#[async_trait]
pub trait LedgerCollection: Send + Sync {
    async fn size(&self) -> Result<u64>;
    async fn get(&self, index: u64) -> Result<ContractRecord>;
    async fn create(&self, from: Address, draft: &ContractDraft) -> Result<PendingTransaction>;
    /// Resolves once the transaction has been included, not necessarily finalized.
    async fn wait(&self, pending: &PendingTransaction) -> Result<TransactionReceipt>;
}

/// Source of the identity that authorizes state-changing calls.
#[async_trait]
pub trait WalletLayer: Send + Sync {
    async fn active_identity(&self) -> Result<Option<Address>>;
}

/// Resolves the identity that will sign a write. A wallet error (typically a
/// declined permission prompt) counts as no signer.
pub async fn resolve_signer(wallet: &dyn WalletLayer) -> Result<Address, RegistryError> {
    match wallet.active_identity().await {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => Err(RegistryError::NoSigner),
        Err(err) => {
            warn!("wallet did not provide an identity: {err:#}");
            Err(RegistryError::NoSigner)
        }
    }
}

pub struct MissingLedger;

#[async_trait]
impl LedgerCollection for MissingLedger {
    async fn size(&self) -> Result<u64> {
        Err(anyhow!("no ledger connection configured"))
    }

    async fn get(&self, index: u64) -> Result<ContractRecord> {
        Err(anyhow!("no ledger connection configured (record {index})"))
    }

    async fn create(&self, _from: Address, _draft: &ContractDraft) -> Result<PendingTransaction> {
        Err(anyhow!("no ledger connection configured"))
    }

    async fn wait(&self, _pending: &PendingTransaction) -> Result<TransactionReceipt> {
        Err(anyhow!("no ledger connection configured"))
    }
}

/// Wallet for read-only visitors: never has a signer.
pub struct MissingWallet;

#[async_trait]
impl WalletLayer for MissingWallet {
    async fn active_identity(&self) -> Result<Option<Address>> {
        Ok(None)
    }
}

/// Wallet pinned to one known account.
pub struct FixedWallet(pub Address);

#[async_trait]
impl WalletLayer for FixedWallet {
    async fn active_identity(&self) -> Result<Option<Address>> {
        Ok(Some(self.0))
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
