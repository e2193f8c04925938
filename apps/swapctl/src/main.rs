use std::{fs, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use registry_core::{
    deploy::{deploy_contract, parse_artifact, ConstructorArg, DeploymentRequest},
    rpc::{RpcClient, RpcLedger, RpcWallet},
    FixedWallet, LedgerCollection, MissingLedger, RegistryEvent, RegistryService, WalletLayer,
};
use shared::domain::DraftForm;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Settings};
use render::{render_receipt, render_snapshot, SubmissionReport};

#[derive(Parser, Debug)]
#[command(name = "swapctl", about = "Browse and create forward swap contracts")]
struct Cli {
    #[arg(long, default_value = "swapctl.toml")]
    config: PathBuf,
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    contract: Option<String>,
    /// Sign with this account instead of asking the node.
    #[arg(long)]
    from: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the registry split into forward swaps and other contracts.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Submit a new contract, then show the refreshed registry.
    Create(CreateArgs),
    /// Refresh the registry periodically.
    Watch {
        #[arg(long, default_value_t = 15)]
        interval_secs: u64,
        /// Stop after this many refreshes.
        #[arg(long)]
        count: Option<usize>,
    },
    /// Read a zero-argument uint256 view function of the registry contract.
    Read { function: String },
    /// Deploy a contract from a compiler artifact or raw bytecode.
    Deploy {
        #[arg(long)]
        artifact: PathBuf,
        #[arg(long)]
        name: Option<String>,
        /// Pass the deployer's address as the first constructor argument.
        #[arg(long)]
        deployer_arg: bool,
        #[arg(long = "arg")]
        args: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// TOML file holding the form fields (camelCase keys).
    #[arg(long)]
    form: Option<PathBuf>,
    #[arg(long)]
    party_a: Option<String>,
    #[arg(long)]
    party_b: Option<String>,
    #[arg(long)]
    eth_notional: Option<String>,
    #[arg(long)]
    usdc_notional: Option<String>,
    #[arg(long)]
    eth_rate: Option<String>,
    #[arg(long)]
    usdc_rate: Option<String>,
    #[arg(long)]
    payment_interval: Option<String>,
    #[arg(long)]
    total_duration: Option<String>,
    #[arg(long)]
    eth_margin: Option<String>,
    #[arg(long)]
    usdc_margin: Option<String>,
    #[arg(long)]
    json: bool,
}

impl CreateArgs {
    fn into_form(self) -> Result<DraftForm> {
        let mut form = match &self.form {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read form '{}'", path.display()))?;
                toml::from_str::<DraftForm>(&raw)
                    .with_context(|| format!("failed to parse form '{}'", path.display()))?
            }
            None => DraftForm::default(),
        };

        let overrides = [
            (self.party_a, &mut form.party_a),
            (self.party_b, &mut form.party_b),
            (self.eth_notional, &mut form.eth_notional),
            (self.usdc_notional, &mut form.usdc_notional),
            (self.eth_rate, &mut form.eth_rate),
            (self.usdc_rate, &mut form.usdc_rate),
            (self.payment_interval, &mut form.payment_interval),
            (self.total_duration, &mut form.total_duration),
            (self.eth_margin, &mut form.eth_margin),
            (self.usdc_margin, &mut form.usdc_margin),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
        Ok(form)
    }
}

struct Collaborators {
    rpc: Arc<RpcClient>,
    ledger: Arc<dyn LedgerCollection>,
    wallet: Arc<dyn WalletLayer>,
}

fn connect(settings: &Settings) -> Result<Collaborators> {
    let rpc = Arc::new(RpcClient::new(settings.rpc_url()?));

    let ledger: Arc<dyn LedgerCollection> = match settings.contract()? {
        Some(contract) => Arc::new(RpcLedger::new(
            rpc.clone(),
            contract,
            settings.tx_options(),
            settings.receipt_polling(),
        )),
        None => {
            warn!("no contract address configured; registry reads will fail");
            Arc::new(MissingLedger)
        }
    };

    let wallet: Arc<dyn WalletLayer> = match settings.signer()? {
        Some(signer) => Arc::new(FixedWallet(signer)),
        None => Arc::new(RpcWallet::new(rpc.clone(), settings.request_accounts)),
    };

    Ok(Collaborators {
        rpc,
        ledger,
        wallet,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(rpc_url) = cli.rpc_url {
        settings.rpc_url = rpc_url;
    }
    if let Some(contract) = cli.contract {
        settings.contract_address = Some(contract);
    }
    if let Some(from) = cli.from {
        settings.signer_address = Some(from);
    }
    info!(rpc_url = %settings.rpc_url, contract = ?settings.contract_address, "swapctl starting");

    let collaborators = connect(&settings)?;
    let service = RegistryService::with_fetch_concurrency(
        collaborators.ledger.clone(),
        collaborators.wallet.clone(),
        settings.fetch_concurrency,
    );

    match cli.command {
        Command::List { json } => {
            let snapshot = service.refresh().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", render_snapshot(&snapshot));
            }
        }
        Command::Create(args) => {
            let json = args.json;
            let form = args.into_form()?;
            let outcome = service.submit(&form).await?;
            if let Err(err) = &outcome.refreshed {
                warn!("contract created but the registry could not be refreshed: {err}");
            }
            let snapshot = outcome.refreshed.as_ref().ok();
            if json {
                let report = SubmissionReport {
                    receipt: &outcome.receipt,
                    registry: snapshot,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render_receipt(&outcome.receipt));
                if let Some(snapshot) = snapshot {
                    print!("\n{}", render_snapshot(snapshot));
                }
            }
        }
        Command::Watch {
            interval_secs,
            count,
        } => watch(service, Duration::from_secs(interval_secs.max(1)), count).await?,
        Command::Read { function } => {
            let contract = settings
                .contract()?
                .ok_or_else(|| anyhow!("reading requires a contract address"))?;
            let ledger = RpcLedger::new(
                collaborators.rpc.clone(),
                contract,
                settings.tx_options(),
                settings.receipt_polling(),
            );
            let value = ledger.read_scalar(&function).await?;
            println!("{function}() = {value} (contract {})", ledger.contract());
        }
        Command::Deploy {
            artifact,
            name,
            deployer_arg,
            args,
        } => {
            let raw = fs::read_to_string(&artifact)
                .with_context(|| format!("failed to read artifact '{}'", artifact.display()))?;
            let (artifact_name, bytecode) = parse_artifact(&raw)?;
            let contract_name = name
                .or(artifact_name)
                .unwrap_or_else(|| artifact.display().to_string());

            let mut constructor_args = Vec::new();
            if deployer_arg {
                constructor_args.push(ConstructorArg::Deployer);
            }
            for arg in args {
                let address = Address::from_str(arg.trim())
                    .with_context(|| format!("invalid constructor argument '{arg}'"))?;
                constructor_args.push(ConstructorArg::Address(address));
            }

            let deployment = deploy_contract(
                &collaborators.rpc,
                collaborators.wallet.as_ref(),
                &settings.tx_options(),
                &settings.receipt_polling(),
                DeploymentRequest {
                    contract_name,
                    bytecode,
                    constructor_args,
                },
            )
            .await?;
            println!(
                "{} deployed at {}",
                deployment.contract_name, deployment.address
            );
        }
    }

    Ok(())
}

async fn watch(service: Arc<RegistryService>, every: Duration, count: Option<usize>) -> Result<()> {
    let events = service.subscribe_events();
    let printer = tokio::spawn(pump_events(events, |event| match event {
        RegistryEvent::Refreshed(snapshot) => println!("{}", render_snapshot(snapshot)),
        RegistryEvent::Submitted(receipt) => println!("{}", render_receipt(receipt)),
        RegistryEvent::Error(report) => eprintln!("{:?}: {}", report.code, report.message),
    }));

    let mut ticker = tokio::time::interval(every);
    let mut done = 0usize;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Failures are already reported through the event stream.
                let _ = service.refresh().await;
                done += 1;
                if count.is_some_and(|count| done >= count) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    drop(service);
    let _ = printer.await;
    Ok(())
}

/// Feeds every event to `sink` until the service goes away. Falling behind skips
/// the missed events but keeps the stream alive. Returns how many were handled.
async fn pump_events(
    mut events: broadcast::Receiver<RegistryEvent>,
    mut sink: impl FnMut(&RegistryEvent),
) -> usize {
    let mut handled = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                sink(&event);
                handled += 1;
            }
            Err(RecvError::Lagged(missed)) => warn!(missed, "event stream lagged"),
            Err(RecvError::Closed) => return handled,
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
