use std::{pin::pin, sync::Arc};

use futures::{stream, StreamExt};
use shared::domain::{IndexedRecord, RegistrySnapshot};
use tracing::{debug, info, warn};

use crate::{LedgerCollection, RegistryError};

pub struct RegistryReader {
    ledger: Arc<dyn LedgerCollection>,
    fetch_concurrency: usize,
}

impl RegistryReader {
    pub fn new(ledger: Arc<dyn LedgerCollection>) -> Self {
        Self::with_concurrency(ledger, 1)
    }

    /// `fetch_concurrency` of 1 fetches strictly one record after another.
    pub fn with_concurrency(ledger: Arc<dyn LedgerCollection>, fetch_concurrency: usize) -> Self {
        Self {
            ledger,
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    pub async fn refresh_registry(&self) -> Result<RegistrySnapshot, RegistryError> {
        self.refresh_unless(|| false).await
    }

    /// Reads the whole registry, giving up with [`RegistryError::Superseded`] as soon as
    /// `superseded` reports true after a fetch completes.
    pub(crate) async fn refresh_unless<F>(
        &self,
        superseded: F,
    ) -> Result<RegistrySnapshot, RegistryError>
    where
        F: Fn() -> bool + Sync,
    {
        let total = self.ledger.size().await.map_err(|err| {
            warn!("registry size unavailable: {err:#}");
            RegistryError::Unavailable(err)
        })?;
        debug!(total, concurrency = self.fetch_concurrency, "fetching registry");

        let ledger = &self.ledger;
        let mut fetches = pin!(stream::iter(0..total)
            .map(move |index| async move { (index, ledger.get(index).await) })
            .buffered(self.fetch_concurrency));

        let capacity = usize::try_from(total).unwrap_or_default().min(4096);
        let mut records = Vec::with_capacity(capacity);
        while let Some((index, fetched)) = fetches.next().await {
            if superseded() {
                debug!(index, "registry refresh superseded");
                return Err(RegistryError::Superseded);
            }
            let record = fetched.map_err(|reason| {
                warn!(index, "contract fetch failed: {reason:#}");
                RegistryError::TransientRead { index, reason }
            })?;
            records.push(IndexedRecord { index, record });
        }

        let snapshot = RegistrySnapshot::classify(records);
        info!(
            total,
            bilateral = snapshot.bilateral.len(),
            other = snapshot.other.len(),
            "registry refreshed"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "tests/reader_tests.rs"]
mod tests;
