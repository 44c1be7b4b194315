//! `humanwork` command line.
//!
//! ```text
//! humanwork [--config humanwork.toml] jobs              open jobs
//! humanwork mine [--account 0x..]                       jobs I posted
//! humanwork post --title .. --description .. --budget 0.5 [--days 30]
//! humanwork approve <project-id>
//! humanwork profile --name .. --age .. --email .. --skills "a, b"
//! humanwork serve                                       read-only JSON API
//! ```
//!
//! Reads need no wallet. Writes sign with the key in
//! `HUMANWORK_WALLET_PRIVATE_KEY`; publishing needs `HUMANWORK_CONTENT_TOKEN`.

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;

use humanwork_engine::config::{load_config, EngineConfig};
use humanwork_engine::content::{ContentResolver, HttpContentStore};
use humanwork_engine::ledger::{LedgerReader, NetworkGuard, RpcLedger};
use humanwork_engine::observability::{logging, metrics};
use humanwork_engine::wallet::LocalWallet;
use humanwork_engine::{ApiServer, JobDraft, JobSynchronizer, Marketplace, ProfileDraft};

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Parser)]
#[command(name = "humanwork")]
#[command(about = "Escrow marketplace engine: list, post and approve jobs", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List open jobs
    Jobs,
    /// List jobs posted by an account (defaults to the wallet account)
    Mine {
        #[arg(long)]
        account: Option<Address>,
    },
    /// Publish a job and escrow its budget
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Budget in ether, e.g. 0.5
        #[arg(long)]
        budget: String,
        /// Days until the deadline
        #[arg(long, default_value_t = 30)]
        days: u64,
        #[arg(long)]
        freelancer: Option<Address>,
    },
    /// Approve submitted work and release the escrow
    Approve { project_id: u64 },
    /// Publish a profile document
    Profile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
        #[arg(long)]
        email: String,
        /// Comma-separated skills
        #[arg(long, default_value = "")]
        skills: String,
    },
    /// Serve the read-only JSON API
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        chain_id = config.ledger.chain_id,
        rpc_url = %config.ledger.rpc_url,
        escrow = %config.ledger.escrow_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let ledger: Arc<dyn LedgerReader> = Arc::new(RpcLedger::connect(config.ledger.clone()).await?);

    match cli.command {
        Commands::Jobs => {
            let jobs = synchronizer(&config, ledger)?.list_open_jobs().await?;
            print_json(&jobs)?;
        }
        Commands::Mine { account } => {
            let account = match account {
                Some(account) => Some(account),
                None => wallet_account(&config).await?,
            };
            let jobs = synchronizer(&config, ledger)?
                .list_jobs_for_account(account)
                .await?;
            print_json(&jobs)?;
        }
        Commands::Post {
            title,
            description,
            budget,
            days,
            freelancer,
        } => {
            let marketplace = marketplace(&config, ledger)?;
            let account = marketplace.active_account().await?;
            let draft = JobDraft {
                title,
                description,
                budget,
                deadline: now_secs() + days.saturating_mul(SECONDS_PER_DAY),
                freelancer,
            };
            print_json(&marketplace.post_job(account, draft).await?)?;
        }
        Commands::Approve { project_id } => {
            let marketplace = marketplace(&config, ledger)?;
            let account = marketplace.active_account().await?;
            print_json(&marketplace.approve_work(account, project_id).await?)?;
        }
        Commands::Profile {
            name,
            age,
            email,
            skills,
        } => {
            let marketplace = marketplace(&config, ledger)?;
            let account = marketplace.active_account().await?;
            let cid = marketplace
                .save_profile(
                    account,
                    ProfileDraft {
                        name,
                        age,
                        email,
                        skills,
                    },
                )
                .await?;
            print_json(&serde_json::json!({ "cid": cid }))?;
        }
        Commands::Serve => {
            let listener = TcpListener::bind(&config.api.bind_address).await?;
            let sync = synchronizer(&config, Arc::clone(&ledger))?;
            ApiServer::new(config.api.clone(), sync, ledger)
                .run(listener)
                .await?;
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}

fn synchronizer(
    config: &EngineConfig,
    ledger: Arc<dyn LedgerReader>,
) -> Result<JobSynchronizer, Box<dyn std::error::Error>> {
    let store = Arc::new(HttpContentStore::from_env(&config.content)?);
    let resolver = ContentResolver::new(store, config.content.cache_enabled);
    Ok(JobSynchronizer::new(
        ledger,
        resolver,
        NetworkGuard::new(config.ledger.chain_id),
        config.sync.max_concurrent_fetches,
    ))
}

fn marketplace(
    config: &EngineConfig,
    ledger: Arc<dyn LedgerReader>,
) -> Result<Marketplace, Box<dyn std::error::Error>> {
    let wallet = Arc::new(LocalWallet::from_env(config.ledger.clone())?);
    let store = Arc::new(HttpContentStore::from_env(&config.content)?);
    Ok(Marketplace::new(ledger, store, wallet, config)?)
}

/// Wallet account when a key is configured, otherwise none.
async fn wallet_account(config: &EngineConfig) -> Result<Option<Address>, Box<dyn std::error::Error>> {
    if std::env::var(humanwork_engine::wallet::local::PRIVATE_KEY_ENV_VAR).is_err() {
        tracing::warn!("No account given and no wallet key configured");
        return Ok(None);
    }
    let wallet = LocalWallet::from_env(config.ledger.clone())?;
    Ok(Some(wallet.address()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
