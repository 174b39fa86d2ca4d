//! The chain read interface consumed by the classifier.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::B256;
use alloy::rpc::types::BlockNumberOrTag;
use async_trait::async_trait;

use crate::contract::ContractHandle;
use crate::error::ChainResult;
use crate::types::{Block, Transaction};

/// Read-only chain access.
///
/// `ChainClient` talks to a node; tests swap in in-memory implementations.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Number of the most recent block known to the node.
    async fn latest_block_number(&self) -> ChainResult<u64>;

    /// Fetch a block with its transaction hashes.
    ///
    /// Returns `ChainError::NotFound` if the node has no such block.
    async fn get_block(&self, block: BlockNumberOrTag) -> ChainResult<Block>;

    /// Fetch a transaction by hash.
    ///
    /// Returns `ChainError::NotFound` if the node does not know the hash
    /// (e.g. it was reorged out).
    async fn get_transaction(&self, hash: B256) -> ChainResult<Transaction>;

    /// Perform a read-only contract call at the latest block and decode its outputs.
    ///
    /// # Arguments
    /// * `contract` - Target contract and its ABI
    /// * `function` - Function name; the overload is picked by `args.len()`
    /// * `args` - Call arguments in declaration order
    async fn call_function(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[DynSolValue],
    ) -> ChainResult<Vec<DynSolValue>>;
}
