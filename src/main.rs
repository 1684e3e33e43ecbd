//! Main entry point for the devnet memecoin demo
//!
//! Connects a local keypair wallet, creates the memecoin catalog on the
//! cluster and optionally trades one of the tokens.

use anyhow::Result;
use clap::Parser;
use devnet_memecoins::workflow::{KeypairWallet, NotificationLevel, WalletAdapter, WorkflowBuilder};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "devnet-memecoins", about = "Create and trade demo tokens on a Solana test cluster")]
struct Args {
    /// Cluster RPC endpoint
    #[arg(long, env = "MEMECOINS_RPC_URL", default_value = "https://api.devnet.solana.com")]
    rpc_url: String,

    /// Keypair file used as the connected wallet
    #[arg(long, env = "MEMECOINS_KEYPAIR")]
    keypair: String,

    /// Token id or symbol to trade once initialization finishes
    #[arg(long)]
    trade: Option<String>,

    /// Extra pause between ledger steps in milliseconds
    #[arg(long, default_value_t = 0)]
    settle_delay_ms: u64,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    info!("Starting devnet memecoin demo against {}", args.rpc_url);

    let wallet: Arc<dyn WalletAdapter> = Arc::new(KeypairWallet::from_file("Local Keypair", &args.keypair)?);

    let (session, mut notifications) = WorkflowBuilder::new()
        .with_rpc_url(args.rpc_url)
        .with_settle_delay(args.settle_delay_ms)
        .with_wallet(wallet)
        .build_rpc();

    // Print notifications as they arrive
    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            let tag = match notification.level {
                NotificationLevel::Success => "ok",
                NotificationLevel::Warning => "warn",
                NotificationLevel::Error => "error",
            };
            match notification.action {
                Some(action) => println!("[{}] {} ({}: {})", tag, notification.message, action.label, action.url),
                None => println!("[{}] {}", tag, notification.message),
            }
        }
    });

    for wallet in session.available_wallets() {
        info!("Available wallet: {}", wallet.display_name);
    }

    session.connect(None).await;

    if let Some(token) = args.trade.as_deref() {
        session.trade(token).await;
    }

    let snapshot = session.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    drop(session);
    printer.await?;

    info!("Demo completed.");
    Ok(())
}
