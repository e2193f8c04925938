use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::anyhow;
use shared::domain::{ContractDraft, DraftForm, TransactionReceipt};
use tracing::info;

use crate::{LedgerCollection, RegistryError, WalletLayer};

/// Turns a filled-in form into one `createContract` transaction.
pub struct SubmissionPipeline {
    ledger: Arc<dyn LedgerCollection>,
    wallet: Arc<dyn WalletLayer>,
}

impl SubmissionPipeline {
    pub fn new(ledger: Arc<dyn LedgerCollection>, wallet: Arc<dyn WalletLayer>) -> Self {
        Self { ledger, wallet }
    }

    pub async fn submit(&self, form: &DraftForm) -> Result<TransactionReceipt, RegistryError> {
        let draft = ContractDraft::try_from_form(form)?;
        self.submit_draft(&draft).await
    }

    pub async fn submit_draft(
        &self,
        draft: &ContractDraft,
    ) -> Result<TransactionReceipt, RegistryError> {
        let signer = self.resolve_signer().await?;
        info!(
            %signer,
            party_a = %draft.party_a,
            party_b = %draft.party_b,
            "submitting createContract"
        );

        let pending = self
            .ledger
            .create(signer, draft)
            .await
            .map_err(RegistryError::Submission)?;
        info!(tx = %pending.hash, "createContract sent, waiting for inclusion");

        let receipt = self
            .ledger
            .wait(&pending)
            .await
            .map_err(RegistryError::Submission)?;
        if !receipt.succeeded {
            return Err(RegistryError::Submission(anyhow!(
                "transaction {} reverted",
                receipt.transaction_hash
            )));
        }

        info!(
            tx = %receipt.transaction_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "createContract included"
        );
        Ok(receipt)
    }

    pub async fn resolve_signer(&self) -> Result<Address, RegistryError> {
        crate::resolve_signer(self.wallet.as_ref()).await
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
