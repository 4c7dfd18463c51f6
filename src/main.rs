//! NEAR Intents swap CLI

use clap::{Parser, Subcommand};
use near_intents_swap::intents::{HttpSolverRelay, SettlementClient, StorageRegistration};
use near_intents_swap::interceptors::AuditLogInterceptor;
use near_intents_swap::tools::{
    ActionReply, BalanceInput, BalanceTool, DepositInput, DepositTool, QuoteTool, SwapInput,
    SwapTool, ToolRunner,
};
use near_intents_swap::wallet::{ChainAccount, NearRpcAccount};
use near_intents_swap::{registry, Config, NearConfig, Result, SwapExecutor};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "intents-swap")]
#[command(about = "Swap tokens through the NEAR Intents solver relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Swap one token for another
    Swap {
        /// Token to sell (ZEC, USDC, NEAR)
        #[arg(long)]
        from: String,

        /// Token to buy
        #[arg(long)]
        to: String,

        /// Amount of `from` to sell, in whole tokens
        #[arg(long)]
        amount: String,
    },

    /// Preview solver quotes without signing
    Quote {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        amount: String,
    },

    /// Deposit tokens into the intents contract
    Deposit {
        #[arg(long)]
        token: String,

        #[arg(long)]
        amount: String,
    },

    /// Show token balances
    Balance {
        /// Single token to check (all tokens if omitted)
        #[arg(long)]
        token: Option<String>,
    },

    /// Register the account's public key with the intents contract
    RegisterKey,

    /// Register storage on a token contract
    RegisterStorage {
        #[arg(long)]
        token: String,

        /// Account to register (defaults to the signing account)
        #[arg(long)]
        account: Option<String>,
    },

    /// List supported tokens
    Assets,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Swap { from, to, amount } => {
            let account = load_account()?;
            let executor = Arc::new(swap_executor(&config));

            let (shutdown_tx, _) = broadcast::channel(1);
            let signal_tx = shutdown_tx.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl+C received, abandoning swap");
                    let _ = signal_tx.send(());
                }
            });

            let tool = SwapTool::new(executor, account, registry().clone()).with_shutdown(shutdown_tx);
            let input = SwapInput {
                input_token: from,
                output_token: to,
                amount,
            };
            report(tool_runner(&config).run(&tool, input).await, cli.verbose)
        }
        Commands::Quote { from, to, amount } => {
            let executor = Arc::new(swap_executor(&config));
            let tool = QuoteTool::new(executor, registry().clone());
            let input = SwapInput {
                input_token: from,
                output_token: to,
                amount,
            };
            report(tool_runner(&config).run(&tool, input).await, cli.verbose)
        }
        Commands::Deposit { token, amount } => {
            let tool = DepositTool::new(settlement_client(&config)?, load_account()?);
            report(
                tool_runner(&config)
                    .run(&tool, DepositInput { token, amount })
                    .await,
                cli.verbose,
            )
        }
        Commands::Balance { token } => {
            let tool = BalanceTool::new(settlement_client(&config)?, load_account()?);
            report(
                tool_runner(&config).run(&tool, BalanceInput { token }).await,
                cli.verbose,
            )
        }
        Commands::RegisterKey => {
            let account = load_account()?;
            let outcome = settlement_client(&config)?
                .register_public_key(account.as_ref())
                .await?;
            println!("Registered public key for {}", account.account_id());
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Commands::RegisterStorage { token, account: on_behalf_of } => {
            let account = load_account()?;
            let outcome = settlement_client(&config)?
                .register_token_storage(account.as_ref(), &token, on_behalf_of.as_deref())
                .await?;
            let target = on_behalf_of.as_deref().unwrap_or(account.account_id());
            match outcome {
                StorageRegistration::Existing(balance) => {
                    println!("{} already has {} storage: {}", target, token.to_uppercase(), balance)
                }
                StorageRegistration::Registered(result) => {
                    println!("Registered {} storage for {}", token.to_uppercase(), target);
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
            }
            Ok(())
        }
        Commands::Assets => {
            for asset in registry().iter() {
                println!(
                    "{:<6} {:<3} decimals  {:<40} {}",
                    asset.symbol,
                    asset.decimals,
                    asset.asset_identifier(),
                    asset.bridge_id.unwrap_or("")
                );
            }
            Ok(())
        }
        Commands::Config => {
            let near = match NearConfig::from_env() {
                Ok(near) => json!({
                    "account_id": near.account_id,
                    "network_id": near.network_id,
                    "rpc_url": near.rpc_url,
                    "secret_key": "[REDACTED]",
                }),
                Err(e) => json!({ "error": e.to_string() }),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "swap": config, "near": near }))?
            );
            Ok(())
        }
    }
}

fn load_account() -> Result<Arc<dyn ChainAccount>> {
    let near = NearConfig::from_env()?;
    let account = NearRpcAccount::from_config(&near)?;
    tracing::info!(
        account_id = %near.account_id,
        network = %near.network_id,
        "Loaded NEAR account"
    );
    Ok(Arc::new(account))
}

fn swap_executor(config: &Config) -> SwapExecutor {
    let relay = Arc::new(HttpSolverRelay::new(config.relay_url.clone()));
    SwapExecutor::new(relay, registry().clone(), config)
}

fn settlement_client(config: &Config) -> Result<Arc<SettlementClient>> {
    Ok(Arc::new(SettlementClient::new(registry().clone(), config)?))
}

fn tool_runner(config: &Config) -> ToolRunner {
    match &config.audit_log_path {
        Some(path) => ToolRunner::new().with_interceptor(Arc::new(AuditLogInterceptor::new(path))),
        None => ToolRunner::new(),
    }
}

fn report(reply: ActionReply, show_data: bool) -> Result<()> {
    println!("{}", reply.text);
    if show_data && !reply.data.is_null() {
        println!("{}", serde_json::to_string_pretty(&reply.data)?);
    }
    if !reply.success {
        std::process::exit(1);
    }
    Ok(())
}
