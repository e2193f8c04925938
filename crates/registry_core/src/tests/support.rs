use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use alloy_primitives::{Address, B256, U256};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{
    ContractDraft, ContractRecord, DraftForm, PendingTransaction, TransactionReceipt,
};
use tokio::sync::{oneshot, Mutex, Notify};

use crate::{LedgerCollection, WalletLayer};

pub(crate) fn party(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub(crate) fn record(eth_notional: u64, usdc_notional: u64) -> ContractRecord {
    ContractRecord {
        party_a: party(0x11),
        party_b: party(0x22),
        eth_notional: U256::from(eth_notional),
        usdc_notional: U256::from(usdc_notional),
        eth_rate: U256::from(4),
        usdc_rate: U256::from(6),
        payment_interval: U256::from(3_600),
        total_duration: U256::from(86_400),
    }
}

pub(crate) fn valid_form() -> DraftForm {
    DraftForm {
        party_a: party(0x11).to_string(),
        party_b: party(0x22).to_string(),
        eth_notional: "5".into(),
        usdc_notional: "10".into(),
        eth_rate: "4".into(),
        usdc_rate: "6".into(),
        payment_interval: "3600".into(),
        total_duration: "86400".into(),
        eth_margin: "1".into(),
        usdc_margin: "2".into(),
    }
}

#[derive(Default)]
pub(crate) struct LedgerCalls {
    pub size: AtomicUsize,
    pub get: AtomicUsize,
    pub create: AtomicUsize,
    pub wait: AtomicUsize,
}

impl LedgerCalls {
    pub fn total(&self) -> usize {
        self.size.load(Ordering::SeqCst)
            + self.get.load(Ordering::SeqCst)
            + self.create.load(Ordering::SeqCst)
            + self.wait.load(Ordering::SeqCst)
    }
}

/// In-memory registry. `create` appends the drafted record, like the contract does.
#[derive(Default)]
pub(crate) struct FakeLedger {
    pub records: Mutex<Vec<ContractRecord>>,
    pub calls: LedgerCalls,
    pub created_by: Mutex<Vec<Address>>,
    fail_size: bool,
    fail_get_at: Option<u64>,
    fail_create: Option<String>,
    revert: bool,
    slower_for_lower_index: bool,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    size_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub gate_entered: Notify,
}

impl FakeLedger {
    pub fn with_records(records: Vec<ContractRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub fn failing_size(mut self) -> Self {
        self.fail_size = true;
        self
    }

    pub fn failing_get_at(mut self, index: u64) -> Self {
        self.fail_get_at = Some(index);
        self
    }

    pub fn failing_create(mut self, reason: impl Into<String>) -> Self {
        self.fail_create = Some(reason.into());
        self
    }

    pub fn reverting(mut self) -> Self {
        self.revert = true;
        self
    }

    /// Record fetches finish in reverse index order.
    pub fn slower_for_lower_index(mut self) -> Self {
        self.slower_for_lower_index = true;
        self
    }

    /// The next `get` blocks until the returned sender fires.
    pub fn gated(self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let ledger = Self {
            gate: Mutex::new(Some(rx)),
            ..self
        };
        (ledger, tx)
    }

    /// The next `size` blocks until the returned sender fires, then fails.
    pub fn gated_failing_size(self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let ledger = Self {
            size_gate: Mutex::new(Some(rx)),
            ..self
        };
        (ledger, tx)
    }
}

#[async_trait]
impl LedgerCollection for FakeLedger {
    async fn size(&self) -> Result<u64> {
        self.calls.size.fetch_add(1, Ordering::SeqCst);

        let gate = self.size_gate.lock().await.take();
        if let Some(gate) = gate {
            self.gate_entered.notify_one();
            let _ = gate.await;
            return Err(anyhow!("connection reset"));
        }

        if self.fail_size {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.records.lock().await.len() as u64)
    }

    async fn get(&self, index: u64) -> Result<ContractRecord> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            self.gate_entered.notify_one();
            let _ = gate.await;
        }

        if self.slower_for_lower_index {
            let len = self.records.lock().await.len() as u64;
            tokio::time::sleep(Duration::from_millis(5 * (len - index))).await;
        }

        if self.fail_get_at == Some(index) {
            return Err(anyhow!("header not found"));
        }
        self.records
            .lock()
            .await
            .get(index as usize)
            .cloned()
            .ok_or_else(|| anyhow!("index {index} out of range"))
    }

    async fn create(&self, from: Address, draft: &ContractDraft) -> Result<PendingTransaction> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.fail_create {
            return Err(anyhow!(reason.clone()));
        }

        self.created_by.lock().await.push(from);
        if !self.revert {
            self.records.lock().await.push(ContractRecord {
                party_a: draft.party_a,
                party_b: draft.party_b,
                eth_notional: draft.eth_notional,
                usdc_notional: draft.usdc_notional,
                eth_rate: draft.eth_rate,
                usdc_rate: draft.usdc_rate,
                payment_interval: draft.payment_interval,
                total_duration: draft.total_duration,
            });
        }
        Ok(PendingTransaction {
            hash: B256::repeat_byte(0xab),
        })
    }

    async fn wait(&self, pending: &PendingTransaction) -> Result<TransactionReceipt> {
        self.calls.wait.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionReceipt {
            transaction_hash: pending.hash,
            block_number: Some(42),
            gas_used: 180_000,
            succeeded: !self.revert,
            contract_address: None,
        })
    }
}

pub(crate) struct FakeWallet {
    identity: Option<Address>,
    fail_with: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeWallet {
    pub fn signer(identity: Address) -> Self {
        Self {
            identity: Some(identity),
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            identity: None,
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn declining() -> Self {
        Self {
            identity: None,
            fail_with: Some("User rejected the request.".into()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WalletLayer for FakeWallet {
    async fn active_identity(&self) -> Result<Option<Address>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(reason) => Err(anyhow!(reason.clone())),
            None => Ok(self.identity),
        }
    }
}
