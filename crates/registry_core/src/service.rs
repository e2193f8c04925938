use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{DraftForm, RegistrySnapshot, TransactionReceipt},
    error::ApiError,
};
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::{LedgerCollection, RegistryError, RegistryReader, SubmissionPipeline, WalletLayer};

#[derive(Debug, Clone)]
pub enum RegistryEvent {
    Refreshed(RegistrySnapshot),
    Submitted(TransactionReceipt),
    Error(ApiError),
}

#[derive(Debug)]
pub struct SubmissionOutcome {
    pub receipt: TransactionReceipt,
    /// The refresh that followed the accepted transaction. An error here leaves the
    /// view stale but does not undo the submission.
    pub refreshed: Result<RegistrySnapshot, RegistryError>,
}

/// Ties the reader and the submission pipeline to one event stream.
///
/// Every refresh takes a new generation; only the most recent one is allowed to
/// publish, so an older refresh still in flight can never overwrite newer data.
pub struct RegistryService {
    reader: RegistryReader,
    pipeline: SubmissionPipeline,
    generation: AtomicU64,
    events: broadcast::Sender<RegistryEvent>,
}

impl RegistryService {
    pub fn new(ledger: Arc<dyn LedgerCollection>, wallet: Arc<dyn WalletLayer>) -> Arc<Self> {
        Self::with_fetch_concurrency(ledger, wallet, 1)
    }

    pub fn with_fetch_concurrency(
        ledger: Arc<dyn LedgerCollection>,
        wallet: Arc<dyn WalletLayer>,
        fetch_concurrency: usize,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            reader: RegistryReader::with_concurrency(ledger.clone(), fetch_concurrency),
            pipeline: SubmissionPipeline::new(ledger, wallet),
            generation: AtomicU64::new(0),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub async fn refresh(&self) -> Result<RegistrySnapshot, RegistryError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let superseded = || self.generation.load(Ordering::SeqCst) != generation;

        let result = match self.reader.refresh_unless(superseded).await {
            _ if superseded() => Err(RegistryError::Superseded),
            other => other,
        };

        match &result {
            Ok(snapshot) => {
                let _ = self.events.send(RegistryEvent::Refreshed(snapshot.clone()));
            }
            Err(RegistryError::Superseded) => {}
            Err(err) => {
                error!(generation, "registry refresh failed: {err}");
                let _ = self.events.send(RegistryEvent::Error(err.into()));
            }
        }
        result
    }

    /// Sends the contract, then refreshes exactly once. Nothing is refreshed when the
    /// submission itself fails.
    pub async fn submit(&self, form: &DraftForm) -> Result<SubmissionOutcome, RegistryError> {
        let receipt = match self.pipeline.submit(form).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!("contract submission failed: {err}");
                let _ = self.events.send(RegistryEvent::Error((&err).into()));
                return Err(err);
            }
        };
        let _ = self.events.send(RegistryEvent::Submitted(receipt.clone()));

        let refreshed = self.refresh().await;
        if let Ok(snapshot) = &refreshed {
            info!(total = snapshot.len(), "registry refreshed after submission");
        }
        Ok(SubmissionOutcome { receipt, refreshed })
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
