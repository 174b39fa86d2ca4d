//! Point-in-time snapshots of chain data as returned by the node.

use alloy::primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};

/// A block with its transaction hashes in block order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// `None` for a pending block.
    pub number: Option<U64>,
    pub hash: Option<B256>,
    #[serde(default)]
    pub transactions: Vec<B256>,
}

impl Block {
    pub fn number_u64(&self) -> Option<u64> {
        self.number.map(|n| n.to::<u64>())
    }
}

/// The subset of a transaction the explorer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    #[serde(default)]
    pub input: Bytes,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}
