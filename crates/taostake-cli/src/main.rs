//! taostake - stake and unstake TAO on a Bittensor validator from the terminal.

mod report;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail, eyre};
use std::path::PathBuf;
use taostake_chain::{ChainClient, KeyringWallet, resolve_endpoint};
use taostake_core::config::{load_config, load_config_from};
use taostake_core::{
    AppConfig, ConnectionStatus, Intent, Network, StakeAction, StakeError, StakeWorkflow,
    WorkflowSettings,
};
use tokio::sync::mpsc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Source name for keys passed with `--suri`.
const CLI_SOURCE: &str = "cli";

/// Stake TAO to a validator hotkey on a Bittensor network.
#[derive(Parser, Debug)]
#[command(name = "taostake")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network preset: finney, testnet or local
    #[arg(short, long, global = true)]
    network: Option<NetworkArg>,

    /// Custom RPC endpoint URL (overrides the network preset)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Path to config.json (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Secret URI of a signing key, e.g. //Alice. May be repeated.
    #[arg(long = "suri", global = true)]
    suris: Vec<String>,

    /// Validator hotkey to stake to
    #[arg(long, global = true)]
    hotkey: Option<String>,

    /// Coldkey address to act as (defaults to the first account)
    #[arg(short, long, global = true)]
    account: Option<String>,

    /// Seconds to wait for a transaction to finalize
    #[arg(long = "timeout-secs", global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// List the accounts available for signing
    Accounts,
    /// Show balance and stake for the selected account and hotkey
    Status,
    /// Stake AMOUNT TAO to the hotkey
    Add { amount: String },
    /// Unstake AMOUNT TAO from the hotkey
    Remove { amount: String },
    /// Unstake everything held on the hotkey
    RemoveMax,
}

impl Command {
    fn stake_action(&self) -> Option<(StakeAction, Option<&str>)> {
        match self {
            Command::Add { amount } => Some((StakeAction::Add, Some(amount))),
            Command::Remove { amount } => Some((StakeAction::Remove, Some(amount))),
            Command::RemoveMax => Some((StakeAction::RemoveMax, None)),
            Command::Accounts | Command::Status => None,
        }
    }
}

/// Network argument that can be parsed from string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NetworkArg(Network);

impl std::str::FromStr for NetworkArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finney" | "mainnet" => Ok(NetworkArg(Network::Finney)),
            "testnet" | "test" => Ok(NetworkArg(Network::Testnet)),
            "local" | "localnet" => Ok(NetworkArg(Network::Local)),
            _ => Err(format!(
                "Unknown network '{}'. Valid options: finney, testnet, local",
                s
            )),
        }
    }
}

/// Layer command-line flags over the loaded (and env-overridden) config.
fn apply_args(config: &mut AppConfig, args: &Args) {
    if let Some(NetworkArg(network)) = args.network {
        config.network = network;
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(hotkey) = &args.hotkey {
        config.default_hotkey = Some(hotkey.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config.finalization_timeout_secs = secs;
    }
}

fn build_wallet(config: &AppConfig, suris: &[String]) -> Result<KeyringWallet> {
    let mut wallet = KeyringWallet::from_accounts(&config.accounts)
        .wrap_err("Failed to load configured accounts")?;
    for suri in suris {
        wallet
            .add_suri(CLI_SOURCE, None, suri)
            .wrap_err("Failed to load --suri key")?;
    }
    Ok(wallet)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install()?;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("taostake=info".parse()?)
        .add_directive("taostake_chain=info".parse()?)
        .add_directive("taostake_core=info".parse()?);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .wrap_err("Failed to load configuration")?;
    config.apply_env(|key| std::env::var(key).ok());
    apply_args(&mut config, &args);
    let settings = WorkflowSettings::from_config(&config)?;

    let wallet = build_wallet(&config, &args.suris)?;
    tracing::info!("Loaded {} key(s) from {} source(s)", wallet.len(), wallet.sources().len());

    let endpoint = resolve_endpoint(config.network, config.endpoint.as_deref());
    let (status_tx, mut status_rx) = mpsc::channel::<ConnectionStatus>(8);
    let status_logger = tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            tracing::debug!("Connection status: {:?}", status);
        }
    });
    let chain = ChainClient::connect(&endpoint, status_tx)
        .await
        .map_err(|e| StakeError::Connection(e.to_string()))
        .wrap_err_with(|| format!("Could not reach {} ({})", config.network, endpoint))?;
    let _ = status_logger.await;

    let info = chain.get_chain_info();
    tracing::info!(
        "{} spec_version {} tx_version {}",
        info.chain_name,
        info.spec_version,
        info.tx_version
    );

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if let Some(line) = report::render_event(&event) {
                eprintln!("{}", line);
            }
        }
    });

    let workflow = StakeWorkflow::new(wallet, chain, settings, events_tx);
    let outcome = run(&workflow, &args).await;

    // Closing the event channel lets the printer drain and exit.
    drop(workflow);
    let _ = printer.await;
    outcome
}

async fn run(workflow: &StakeWorkflow<KeyringWallet, ChainClient>, args: &Args) -> Result<()> {
    let count = workflow.initialize().await?;
    if count == 0 {
        bail!("No accounts found. Pass --suri or add accounts to config.json.");
    }

    if let Some(address) = &args.account {
        workflow
            .dispatch(Intent::SelectAccount(address.clone()))
            .await?;
        let selected = workflow.view().selected.map(|a| a.address);
        if selected.as_deref() != Some(address.as_str()) {
            bail!("Account {} is not available for signing", address);
        }
    }

    let units = &workflow.settings().units;
    match args.command.stake_action() {
        None if args.command == Command::Accounts => {
            let view = workflow.view();
            println!("{}", report::render_accounts(&view.accounts, view.selected.as_ref()));
        }
        None => {
            println!("{}", report::render_view(&workflow.view(), units));
            let (number, hash) = workflow.chain().get_latest_block().await?;
            println!("{}", report::render_block(number, &hex::encode(hash)));
        }
        Some((action, amount)) => {
            if let Some(amount) = amount {
                workflow.dispatch(Intent::SetAmount(amount.to_string())).await?;
            }
            if workflow.view().context().is_none() {
                return Err(eyre!(
                    "No validator hotkey. Pass --hotkey or set TAOSTAKE_VALIDATOR_ADDRESS."
                ));
            }
            workflow.dispatch(Intent::Submit(action)).await?;
            println!("{}", report::render_view(&workflow.view(), units));
        }
    }
    Ok(())
}
