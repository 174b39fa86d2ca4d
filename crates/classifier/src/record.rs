//! Output records of a classification run.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use tx_explorer_chain::{ContractHandle, Transaction};

use crate::decode::{CallArgument, DecodedCall};
use crate::error::ClassifyError;

/// Transaction page on the public block explorer.
pub const EXPLORER_TX_URL: &str = "https://etherscan.io/tx/";

/// Which contract family a classification run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Nft,
    Erc20,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Nft => "nft",
            TransferKind::Erc20 => "erc20",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nft" | "erc721" => Ok(TransferKind::Nft),
            "erc20" | "token" => Ok(TransferKind::Erc20),
            other => Err(format!("unknown transfer kind: {}", other)),
        }
    }
}

/// A matching transaction together with its decoded, enriched transfer.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedTransactionRecord {
    /// Index of the transaction within its block.
    pub position: usize,
    pub tx_hash: B256,
    #[serde(serialize_with = "checksummed")]
    pub from: Address,
    /// The contract the transaction called.
    #[serde(serialize_with = "checksummed")]
    pub contract: Address,
    pub explorer_url: String,
    pub function: String,
    pub arguments: Vec<CallArgument>,
    pub details: TransferDetails,
}

impl EnrichedTransactionRecord {
    pub fn new(
        position: usize,
        tx: &Transaction,
        contract: &ContractHandle,
        call: &DecodedCall,
        details: TransferDetails,
    ) -> Self {
        Self {
            position,
            tx_hash: tx.hash,
            from: tx.from,
            contract: contract.address(),
            explorer_url: format!("{}{}", EXPLORER_TX_URL, tx.hash),
            function: call.function.clone(),
            arguments: call.arguments(),
            details,
        }
    }

    pub fn as_nft(&self) -> Option<&NftTransfer> {
        match &self.details {
            TransferDetails::Nft(nft) => Some(nft),
            TransferDetails::Erc20(_) => None,
        }
    }

    pub fn as_erc20(&self) -> Option<&Erc20Transfer> {
        match &self.details {
            TransferDetails::Erc20(erc20) => Some(erc20),
            TransferDetails::Nft(_) => None,
        }
    }
}

/// Kind-specific part of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferDetails {
    Nft(NftTransfer),
    Erc20(Erc20Transfer),
}

/// An NFT moving to a new owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NftTransfer {
    #[serde(serialize_with = "display")]
    pub token_id: U256,
    #[serde(serialize_with = "checksummed")]
    pub recipient: Address,
    /// `tokenURI` as returned by the contract.
    pub metadata_url: String,
    pub image_url: String,
}

/// An ERC-20 amount moving to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Erc20Transfer {
    #[serde(serialize_with = "checksummed")]
    pub recipient: Address,
    #[serde(serialize_with = "display")]
    pub raw_value: U256,
    /// `raw_value / 10^decimals`, exact.
    pub formatted_value: String,
    /// `raw_value / 10^decimals` as a `Decimal`.
    #[serde(serialize_with = "display")]
    pub value: Decimal,
    /// Set when `value` had to drop digits to fit a `Decimal`.
    pub value_truncated: bool,
    pub symbol: String,
    pub decimals: u8,
    /// Set when the token did not answer `decimals()` and 18 was used instead.
    pub decimals_assumed: bool,
}

/// A matching transaction that could not be decoded or enriched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationFailure {
    pub position: usize,
    pub tx_hash: B256,
    pub category: &'static str,
    #[serde(serialize_with = "display")]
    pub error: ClassifyError,
}

/// Result of one classification run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    /// Number of transactions looked at (after the scan limit).
    pub inspected: usize,
    /// Records in block order.
    pub records: Vec<EnrichedTransactionRecord>,
    /// Failures in block order.
    pub failures: Vec<ClassificationFailure>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.failures.is_empty()
    }
}

fn display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn checksummed<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&address.to_checksum(None))
}
