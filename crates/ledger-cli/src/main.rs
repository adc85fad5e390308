mod backend;
mod menu;
mod render;

use anyhow::{Context, Result};
use backend::Backend;
use clap::{Parser, Subcommand};
use ledger_core::constants::GENESIS_DIFFICULTY;
use ledger_core::Request;
use ledger_node::{constants::DEFAULT_LISTEN, NodeClient, NodeConfig};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Menu-driven client for the proof-of-work ledger")]
struct Cli {
    /// Node address (e.g. 127.0.0.1:6789)
    #[arg(long, default_value = DEFAULT_LISTEN, conflicts_with = "local")]
    node: String,

    /// Run against an in-process ledger instead of a node
    #[arg(long)]
    local: bool,

    /// Genesis difficulty of the in-process ledger
    #[arg(long, default_value_t = GENESIS_DIFFICULTY)]
    genesis_difficulty: u32,

    /// Skip the hash-rate benchmark of the in-process ledger
    #[arg(long)]
    skip_benchmark: bool,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive menu (the default)
    Menu,
    /// Show chain status
    Status,
    /// Mine and append a block
    Add {
        #[arg(long)]
        difficulty: u32,
        /// Transaction data
        #[arg(long)]
        data: String,
    },
    /// Verify the whole chain
    Verify,
    /// Dump the chain as JSON
    View,
    /// Overwrite a block's data without re-mining it
    Corrupt {
        #[arg(long)]
        block_id: i64,
        #[arg(long)]
        data: String,
    },
    /// Re-mine and relink the chain
    Repair,
}

impl Command {
    fn into_request(self) -> Option<Request> {
        Some(match self {
            Command::Menu => return None,
            Command::Status => Request::Status,
            Command::Add { difficulty, data } => Request::Add { difficulty, data },
            Command::Verify => Request::Verify,
            Command::View => Request::View,
            Command::Corrupt { block_id, data } => Request::Corrupt { block_id, data },
            Command::Repair => Request::Repair,
        })
    }
}

async fn connect(cli: &Cli) -> Result<Backend> {
    if cli.local {
        let config = NodeConfig {
            genesis_difficulty: cli.genesis_difficulty,
            benchmark: !cli.skip_benchmark,
            ..NodeConfig::default()
        };
        let service = config
            .build_service()
            .context("failed to initialise the local ledger")?;
        return Ok(Backend::Local(service));
    }
    let client = NodeClient::connect(cli.node.as_str())
        .await
        .with_context(|| format!("failed to connect to {}", cli.node))?;
    info!(node = %cli.node, "connected");
    Ok(Backend::Remote(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut cli = Cli::parse();
    let mut backend = connect(&cli).await?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.cmd.take().and_then(Command::into_request) {
        Some(request) => {
            if let Some(response) = backend.send(request).await? {
                render::render(&response, &mut out)?;
            }
        }
        None => {
            let stdin = std::io::stdin();
            menu::run(&mut backend, &mut stdin.lock(), &mut out).await?;
        }
    }

    backend.finish().await?;
    Ok(())
}
