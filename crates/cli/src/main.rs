//! CLI application for the transaction explorer.

use clap::{Parser, Subcommand};
use tracing::info;
use tx_explorer_chain::BlockNumberOrTag;
use tx_explorer_classifier::TransferKind;
use tx_explorer_cli::{parse_block, serve, AppState, ExplorerArgs};
use tx_explorer_telemetry::{init_logging, LogFormat, Metrics};

#[derive(Parser)]
#[command(name = "tx-explorer")]
#[command(about = "Block explorer for NFT and ERC-20 transfers on an Ethereum-compatible chain")]
struct Cli {
    #[command(flatten)]
    explorer: ExplorerArgs,

    /// Log level or filter directive
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format (json or compact)
    #[arg(long, default_value = "json", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTML explorer
    Serve {
        /// Address the web server binds to
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind_address: String,
    },
    /// Classify one block and print the result as JSON
    Classify {
        /// Block number, 0x-prefixed hex number, or tag (latest, finalized, ...)
        #[arg(long, default_value = "latest", value_parser = parse_block)]
        block: BlockNumberOrTag,

        /// Contract family to match (nft or erc20)
        #[arg(long, default_value = "nft")]
        kind: TransferKind,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_format)?;

    let metrics = Metrics::new()?;
    let (explorer, latest_block) = cli.explorer.build(metrics.clone()).await?;

    match cli.command {
        Commands::Serve { bind_address } => {
            info!("Starting transaction explorer");
            serve(&bind_address, AppState::new(explorer, metrics, latest_block)).await?;
        }
        Commands::Classify { block, kind } => {
            let classification = explorer.transfers(block, kind).await?;
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
    }

    Ok(())
}
