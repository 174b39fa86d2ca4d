//! Block-level pipeline: fetch a block, fetch its transactions, classify them.

use std::sync::Arc;

use alloy::rpc::types::BlockNumberOrTag;
use tracing::{debug, info};
use tx_explorer_chain::{ChainReader, ChainResult, ContractHandle, Transaction};

use crate::classifier::TransactionClassifier;
use crate::record::{Classification, TransferKind};

/// Explorer over one chain and its two known contracts.
///
/// Built once at startup and shared between requests.
pub struct BlockExplorer {
    chain: Arc<dyn ChainReader>,
    classifier: TransactionClassifier,
    nft: ContractHandle,
    erc20: ContractHandle,
}

impl BlockExplorer {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        classifier: TransactionClassifier,
        nft: ContractHandle,
        erc20: ContractHandle,
    ) -> Self {
        Self {
            chain,
            classifier,
            nft,
            erc20,
        }
    }

    pub fn contract(&self, kind: TransferKind) -> &ContractHandle {
        match kind {
            TransferKind::Nft => &self.nft,
            TransferKind::Erc20 => &self.erc20,
        }
    }

    pub async fn latest_block_number(&self) -> ChainResult<u64> {
        self.chain.latest_block_number().await
    }

    /// Fetch the block and the transactions inside the scan window, in block order.
    ///
    /// Transactions are fetched one at a time; the first failing fetch aborts.
    pub async fn block_transactions(&self, block: BlockNumberOrTag) -> ChainResult<Vec<Transaction>> {
        let block_data = self.chain.get_block(block).await?;
        let hashes = self.classifier.window(&block_data.transactions);

        debug!(
            "Fetching {} of {} transactions in block {}",
            hashes.len(),
            block_data.transactions.len(),
            block_data
                .number_u64()
                .map_or_else(|| block.to_string(), |n| n.to_string())
        );

        let mut transactions = Vec::with_capacity(hashes.len());
        for hash in hashes {
            transactions.push(self.chain.get_transaction(*hash).await?);
        }
        Ok(transactions)
    }

    /// Classify the block's transactions against the contract of `kind`.
    pub async fn transfers(
        &self,
        block: BlockNumberOrTag,
        kind: TransferKind,
    ) -> ChainResult<Classification> {
        info!("Looking up {} transfers in block {}", kind, block);
        let transactions = self.block_transactions(block).await?;
        Ok(self
            .classifier
            .classify(&transactions, self.contract(kind), kind)
            .await)
    }

    pub async fn nft_transfers(&self, block: BlockNumberOrTag) -> ChainResult<Classification> {
        self.transfers(block, TransferKind::Nft).await
    }

    pub async fn erc20_transfers(&self, block: BlockNumberOrTag) -> ChainResult<Classification> {
        self.transfers(block, TransferKind::Erc20).await
    }
}
