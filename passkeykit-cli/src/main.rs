//! `PasskeyKit` developer CLI.
//!
//! Derives the Stellar account of a passkey credential, looks accounts up on
//! Horizon and provisions them through a parent account or friendbot.

use clap::{Args, Parser, Subcommand};
use eyre::{bail, Result, WrapErr};
use passkeykit_core::{
    defaults::NetworkEndpoints,
    keys::strkey::{self, VERSION_ACCOUNT_ID},
    AccountProvisioner, Amount, Credential, DerivedKeypair, FundingStrategy, HorizonLedger,
    Ledger, LedgerAccountStatus, Network, ProvisioningOutcome,
};
use secrecy::SecretString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "passkeykit")]
#[command(about = "Derive, look up and provision passkey-backed Stellar accounts", long_about = None)]
#[command(version)]
struct Cli {
    /// Stellar network (testnet, mainnet)
    #[arg(long, global = true, env = "PASSKEYKIT_NETWORK", default_value = "testnet")]
    network: Network,

    /// Secret seed (`S...`) of the account funding new accounts
    #[arg(long, global = true, env = "PASSKEYKIT_PARENT_SECRET", hide_env_values = true)]
    parent_secret: Option<String>,

    /// Balance new accounts are created with, in lumens
    #[arg(long, global = true, default_value = "5")]
    starting_balance: Amount,

    /// Horizon base URL, overriding the network default
    #[arg(long, global = true)]
    horizon_url: Option<String>,

    /// Friendbot base URL, overriding the network default
    #[arg(long, global = true)]
    friendbot_url: Option<String>,

    /// Fund new accounts with friendbot instead of the parent account
    #[arg(long, global = true)]
    friendbot: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the account derived from a credential
    Derive {
        #[command(flatten)]
        source: SourceArgs,

        /// Also print the secret seed
        #[arg(long)]
        show_secret: bool,
    },

    /// Look an account up on Horizon
    Check {
        /// Account id (`G...`)
        public_key: String,
    },

    /// Fund an account with friendbot
    Fund {
        /// Account id (`G...`)
        public_key: String,
    },

    /// Derive the account of a credential and create it unless it exists
    Provision {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Stringified credential key (`ed25519:<base58>`), or hex bytes with `--hex`
    source: String,

    /// Read the credential public key as hex
    #[arg(long)]
    hex: bool,
}

impl SourceArgs {
    fn keypair(&self) -> Result<DerivedKeypair> {
        let source = if self.hex {
            let bytes = hex::decode(self.source.trim_start_matches("0x"))
                .wrap_err("credential public key is not valid hex")?;
            Credential::new(bytes).source_string()
        } else {
            self.source.clone()
        };
        Ok(DerivedKeypair::derive(&source)?)
    }
}

impl Cli {
    fn endpoints(&self) -> Result<NetworkEndpoints> {
        let mut endpoints = NetworkEndpoints::from_network(self.network);
        if let Some(url) = self.horizon_url.as_deref() {
            endpoints = endpoints.with_horizon_url(url)?;
        }
        if let Some(url) = self.friendbot_url.as_deref() {
            endpoints = endpoints.with_friendbot_url(url)?;
        }
        Ok(endpoints)
    }

    const fn funding(&self) -> FundingStrategy {
        if self.friendbot {
            FundingStrategy::Faucet
        } else {
            FundingStrategy::Parent
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &cli.command {
        Command::Derive {
            source,
            show_secret,
        } => {
            let keypair = source.keypair()?;
            println!("{}", keypair.public_key());
            if *show_secret {
                println!("{}", keypair.secret_seed());
            }
        }
        Command::Check { public_key } => {
            ensure_account_id(public_key)?;
            let ledger = HorizonLedger::new(cli.endpoints()?);
            match ledger.check_exists(public_key).await? {
                LedgerAccountStatus::Found { account_id, record } => {
                    println!("found {account_id}");
                    if let Some(sequence) = record.get("sequence").and_then(|s| s.as_str()) {
                        println!("sequence {sequence}");
                    }
                }
                LedgerAccountStatus::NotFound => println!("not found"),
            }
        }
        Command::Fund { public_key } => {
            ensure_account_id(public_key)?;
            let ledger = HorizonLedger::new(cli.endpoints()?);
            let response = ledger
                .fund_with_faucet(public_key)
                .await
                .wrap_err("friendbot did not fund the account")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Provision { source } => provision(&cli, source).await?,
    }

    Ok(())
}

async fn provision(cli: &Cli, source: &SourceArgs) -> Result<()> {
    let keypair = source.keypair()?;
    let public_key = keypair.public_key();
    let ledger = HorizonLedger::new(cli.endpoints()?);

    if ledger.check_exists(public_key).await?.is_found() {
        tracing::info!("account {public_key} already exists, nothing to provision");
        println!("{public_key}");
        return Ok(());
    }

    let funding = cli.funding();
    let parent_secret = match (funding, cli.parent_secret.as_deref()) {
        (FundingStrategy::Parent, None) => {
            bail!("--parent-secret (or PASSKEYKIT_PARENT_SECRET) is required without --friendbot")
        }
        (_, secret) => SecretString::from(secret.unwrap_or_default().to_string()),
    };

    let outcome = AccountProvisioner::new(&ledger, funding, cli.starting_balance, &parent_secret)?
        .provision(public_key)
        .await?;

    match outcome {
        ProvisioningOutcome::Submitted(receipt) => {
            tracing::info!(hash = %receipt.hash, ledger = ?receipt.ledger, "account created");
        }
        ProvisioningOutcome::Faucet(Some(_)) => tracing::info!("account funded by friendbot"),
        ProvisioningOutcome::Faucet(None) => {
            tracing::warn!("friendbot did not fund the account; it may not exist yet");
        }
    }
    println!("{public_key}");
    Ok(())
}

fn ensure_account_id(public_key: &str) -> Result<()> {
    strkey::decode(VERSION_ACCOUNT_ID, public_key)
        .wrap_err_with(|| format!("{public_key} is not a Stellar account id"))?;
    Ok(())
}
