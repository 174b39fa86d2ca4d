//! Classification of block transactions into enriched NFT and ERC-20 transfer records.

pub mod abi;
pub mod amount;
pub mod classifier;
pub mod decode;
pub mod enrichment;
pub mod error;
pub mod explorer;
pub mod metadata;
pub mod record;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classifier::{TransactionClassifier, DEFAULT_SCAN_LIMIT};
pub use decode::{decode_call, DecodedCall};
pub use error::{ClassifyError, DecodeError};
pub use explorer::BlockExplorer;
pub use metadata::{HttpMetadataFetcher, MetadataFetcher};
pub use record::{
    Classification, ClassificationFailure, EnrichedTransactionRecord, Erc20Transfer, NftTransfer,
    TransferDetails, TransferKind,
};
