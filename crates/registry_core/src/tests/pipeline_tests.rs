use std::sync::atomic::Ordering;

use alloy_primitives::{B256, U256};
use shared::domain::DraftField;

use super::*;
use crate::test_support::*;

fn pipeline(ledger: &Arc<FakeLedger>, wallet: &Arc<FakeWallet>) -> SubmissionPipeline {
    SubmissionPipeline::new(ledger.clone(), wallet.clone())
}

#[tokio::test]
async fn missing_signer_issues_no_ledger_calls() {
    let ledger = Arc::new(FakeLedger::default());
    let wallet = Arc::new(FakeWallet::empty());

    let err = pipeline(&ledger, &wallet)
        .submit(&valid_form())
        .await
        .expect_err("no signer");

    assert!(matches!(err, RegistryError::NoSigner));
    assert_eq!(ledger.calls.total(), 0);
}

#[tokio::test]
async fn declined_wallet_counts_as_no_signer() {
    let ledger = Arc::new(FakeLedger::default());
    let wallet = Arc::new(FakeWallet::declining());

    let err = pipeline(&ledger, &wallet)
        .submit(&valid_form())
        .await
        .expect_err("declined");

    assert!(matches!(err, RegistryError::NoSigner));
    assert_eq!(ledger.calls.total(), 0);
}

#[tokio::test]
async fn invalid_form_fails_before_any_io() {
    let ledger = Arc::new(FakeLedger::default());
    let wallet = Arc::new(FakeWallet::signer(party(0x33)));
    let mut form = valid_form();
    form.eth_notional = "five".into();

    let err = pipeline(&ledger, &wallet)
        .submit(&form)
        .await
        .expect_err("invalid");

    match err {
        RegistryError::Validation(err) => assert_eq!(err.field(), DraftField::EthNotional),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(wallet.calls.load(Ordering::SeqCst), 0);
    assert_eq!(ledger.calls.total(), 0);
}

#[tokio::test]
async fn successful_submission_creates_once_from_the_signer() {
    let ledger = Arc::new(FakeLedger::with_records(vec![record(1, 1)]));
    let signer = party(0x33);
    let wallet = Arc::new(FakeWallet::signer(signer));

    let receipt = pipeline(&ledger, &wallet)
        .submit(&valid_form())
        .await
        .expect("submitted");

    assert!(receipt.succeeded);
    assert_eq!(receipt.transaction_hash, B256::repeat_byte(0xab));
    assert_eq!(ledger.calls.create.load(Ordering::SeqCst), 1);
    assert_eq!(ledger.calls.wait.load(Ordering::SeqCst), 1);
    assert_eq!(*ledger.created_by.lock().await, vec![signer]);

    let records = ledger.records.lock().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].usdc_notional, U256::from(10));
}

#[tokio::test]
async fn rejected_transaction_is_a_submission_error() {
    let ledger = Arc::new(FakeLedger::default().failing_create("insufficient funds for gas"));
    let wallet = Arc::new(FakeWallet::signer(party(0x33)));

    let err = pipeline(&ledger, &wallet)
        .submit(&valid_form())
        .await
        .expect_err("rejected");

    assert!(matches!(err, RegistryError::Submission(_)));
    assert!(err.to_string().contains("insufficient funds"));
    assert_eq!(ledger.calls.wait.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reverted_transaction_is_a_submission_error() {
    let ledger = Arc::new(FakeLedger::default().reverting());
    let wallet = Arc::new(FakeWallet::signer(party(0x33)));

    let err = pipeline(&ledger, &wallet)
        .submit(&valid_form())
        .await
        .expect_err("reverted");

    assert!(matches!(err, RegistryError::Submission(_)));
    assert!(err.to_string().contains("reverted"));
}

#[tokio::test]
async fn read_only_wallet_never_signs() {
    let ledger = Arc::new(FakeLedger::default());
    let pipeline = SubmissionPipeline::new(ledger.clone(), Arc::new(crate::MissingWallet));

    let err = pipeline.resolve_signer().await.expect_err("read only");

    assert!(matches!(err, RegistryError::NoSigner));
    assert_eq!(ledger.calls.total(), 0);
}
