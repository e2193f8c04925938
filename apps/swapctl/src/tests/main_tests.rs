use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

use clap::CommandFactory;

use super::*;

fn create_args(argv: &[&str]) -> CreateArgs {
    let cli = Cli::try_parse_from(argv).expect("parse");
    match cli.command {
        Command::Create(args) => args,
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn flags_fill_the_form_verbatim() {
    let form = create_args(&[
        "swapctl",
        "create",
        "--party-a",
        "0x1111111111111111111111111111111111111111",
        "--eth-notional",
        " 5 ",
        "--usdc-margin",
        "2",
    ])
    .into_form()
    .expect("form");

    assert_eq!(form.party_a, "0x1111111111111111111111111111111111111111");
    assert_eq!(form.eth_notional, " 5 ");
    assert_eq!(form.usdc_margin, "2");
    assert!(form.party_b.is_empty());
}

#[test]
fn flags_override_the_form_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("swapctl_form_{suffix}.toml"));
    fs::write(
        &path,
        r#"
partyA = "0x1111111111111111111111111111111111111111"
partyB = "0x2222222222222222222222222222222222222222"
ethNotional = "5"
usdcNotional = "10"
ethRate = "3"
usdcRate = "4"
paymentInterval = "60"
totalDuration = "3600"
ethMargin = "1"
usdcMargin = "1"
"#,
    )
    .expect("write form");

    let path_arg = path.to_string_lossy().to_string();
    let form = create_args(&["swapctl", "create", "--form", &path_arg, "--eth-rate", "7"])
        .into_form()
        .expect("form");
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(form.eth_rate, "7");
    assert_eq!(form.usdc_rate, "4");
    assert_eq!(form.party_b, "0x2222222222222222222222222222222222222222");
}

#[test]
fn missing_contract_reads_as_unavailable() {
    let collaborators = connect(&Settings::default()).expect("connect");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let err = runtime
        .block_on(collaborators.ledger.size())
        .expect_err("no contract");

    assert!(err.to_string().contains("no ledger connection"));
}

#[test]
fn signer_flag_pins_the_wallet() {
    let settings = Settings {
        signer_address: Some("0x3333333333333333333333333333333333333333".into()),
        ..Settings::default()
    };
    let collaborators = connect(&settings).expect("connect");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let identity = runtime
        .block_on(collaborators.wallet.active_identity())
        .expect("identity");

    assert_eq!(identity, Some(Address::repeat_byte(0x33)));
}

#[tokio::test]
async fn lagging_watch_keeps_printing_until_closed() {
    let (sender, events) = broadcast::channel(2);
    for code in 0..5u64 {
        let receipt = shared::domain::TransactionReceipt {
            transaction_hash: alloy_primitives::B256::with_last_byte(code as u8),
            block_number: Some(code),
            gas_used: 21_000,
            succeeded: true,
            contract_address: None,
        };
        sender.send(RegistryEvent::Submitted(receipt)).expect("receiver alive");
    }
    drop(sender);

    let mut seen = Vec::new();
    let handled = pump_events(events, |event| {
        if let RegistryEvent::Submitted(receipt) = event {
            seen.push(receipt.block_number);
        }
    })
    .await;

    assert_eq!(handled, 2);
    assert_eq!(seen, vec![Some(3), Some(4)]);
}
