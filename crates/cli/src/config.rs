//! Command-line configuration and startup wiring.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::Context;
use clap::Args;
use tracing::info;
use tx_explorer_chain::{BlockNumberOrTag, ChainClient};
use tx_explorer_classifier::abi::{erc20_contract, nft_contract};
use tx_explorer_classifier::metadata::DEFAULT_IPFS_GATEWAY;
use tx_explorer_classifier::{BlockExplorer, HttpMetadataFetcher, TransactionClassifier};
use tx_explorer_telemetry::Metrics;

/// Connection and contract settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct ExplorerArgs {
    /// Ethereum execution RPC URL
    #[arg(
        long,
        env = "TX_EXPLORER_RPC_URL",
        default_value = "http://127.0.0.1:8545",
        global = true
    )]
    pub rpc_url: String,

    /// NFT (ERC-721) collection address
    #[arg(
        long,
        default_value = "0x7D8820FA92EB1584636f4F5b8515B5476B75171a",
        global = true
    )]
    pub nft_address: Address,

    /// ERC-20 token address
    #[arg(
        long,
        default_value = "0x5CA9a71B1d01849C0a95490Cc00559717fCF0D1d",
        global = true
    )]
    pub erc20_address: Address,

    /// ERC-721 ABI JSON file, replaces the embedded interface
    #[arg(long, global = true)]
    pub nft_abi: Option<PathBuf>,

    /// ERC-20 ABI JSON file, replaces the embedded interface
    #[arg(long, global = true)]
    pub erc20_abi: Option<PathBuf>,

    /// Number of leading transactions inspected per block
    #[arg(long, default_value = "17", global = true)]
    pub scan_limit: usize,

    /// Inspect every transaction in the block, ignoring --scan-limit
    #[arg(long, default_value = "false", global = true)]
    pub full_block: bool,

    /// HTTP gateway used for ipfs:// metadata and image URIs
    #[arg(long, default_value = DEFAULT_IPFS_GATEWAY, global = true)]
    pub ipfs_gateway: String,

    /// Timeout in seconds for node calls and metadata fetches
    #[arg(long, default_value = "10", global = true)]
    pub request_timeout_secs: u64,
}

impl ExplorerArgs {
    /// Effective scan window; `None` scans whole blocks.
    pub fn scan_limit(&self) -> anyhow::Result<Option<usize>> {
        if self.full_block {
            return Ok(None);
        }
        if self.scan_limit == 0 {
            anyhow::bail!("--scan-limit must be at least 1 (use --full-block to scan everything)");
        }
        Ok(Some(self.scan_limit))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load contract interfaces, connect to the node and assemble the explorer.
    ///
    /// Returns the explorer together with the latest block number the node
    /// reported while being probed, if any.
    pub async fn build(&self, metrics: Metrics) -> anyhow::Result<(BlockExplorer, Option<u64>)> {
        let scan_limit = self.scan_limit()?;

        let nft = nft_contract(self.nft_address, self.nft_abi.as_deref())
            .context("Failed to load NFT contract interface")?;
        let erc20 = erc20_contract(self.erc20_address, self.erc20_abi.as_deref())
            .context("Failed to load ERC-20 contract interface")?;

        let chain = ChainClient::connect(&self.rpc_url, self.request_timeout(), metrics.clone())
            .await
            .context("Failed to create chain client")?;
        let latest_block = chain.probed_block();

        let metadata = HttpMetadataFetcher::new(self.request_timeout(), &self.ipfs_gateway, metrics.clone())
            .context("Failed to create metadata client")?;

        info!(
            nft = %nft.address(),
            erc20 = %erc20.address(),
            scan_limit = ?scan_limit,
            "Explorer configured"
        );

        let chain = Arc::new(chain);
        let classifier = TransactionClassifier::new(chain.clone(), Arc::new(metadata), metrics, scan_limit);
        Ok((BlockExplorer::new(chain, classifier, nft, erc20), latest_block))
    }
}

/// Parse a block given as a decimal number, `0x` hex, or a tag such as `latest`.
pub fn parse_block(s: &str) -> Result<BlockNumberOrTag, String> {
    if let Ok(number) = s.parse::<u64>() {
        return Ok(BlockNumberOrTag::Number(number));
    }
    BlockNumberOrTag::from_str(s).map_err(|e| format!("invalid block {}: {}", s, e))
}
