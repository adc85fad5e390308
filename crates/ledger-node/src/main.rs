use anyhow::Context;
use clap::Parser;
use ledger_node::{constants::DEFAULT_LISTEN, serve, NodeConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger served over a line-delimited JSON socket")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:6789
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: SocketAddr,

    /// Difficulty of the genesis block
    #[arg(long, default_value_t = ledger_core::constants::GENESIS_DIFFICULTY)]
    genesis_difficulty: u32,

    /// Refuse add requests above this difficulty
    #[arg(long)]
    max_difficulty: Option<u32>,

    /// Skip the startup hash-rate benchmark
    #[arg(long)]
    skip_benchmark: bool,
}

impl From<Args> for NodeConfig {
    fn from(args: Args) -> Self {
        NodeConfig {
            listen: args.listen,
            genesis_difficulty: args.genesis_difficulty,
            max_difficulty: args.max_difficulty,
            benchmark: !args.skip_benchmark,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::from(Args::parse());
    let mut service = config
        .build_service()
        .context("failed to initialise the ledger")?;

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("ledger-node listening on {}", config.listen);

    serve(listener, &mut service, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await?;

    info!(blocks = service.ledger().len(), "ledger-node stopped");
    Ok(())
}
