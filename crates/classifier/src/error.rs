//! Errors raised while decoding and enriching a single transaction.

use tx_explorer_chain::ChainError;

/// Call data could not be matched against or decoded with the contract ABI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Input of {0} bytes is too short to hold a function selector")]
    InputTooShort(usize),
    #[error("Function selector {0} not found in ABI")]
    UnknownSelector(String),
    #[error("Malformed arguments for {function}: {reason}")]
    Malformed { function: String, reason: String },
}

/// Error type for per-transaction classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("Metadata fetch from {url} failed: {reason}")]
    MetadataFetch { url: String, reason: String },
    #[error("Decoded call {function} has no argument {argument}")]
    MissingArgument { function: String, argument: String },
    #[error("Unexpected value for {0}")]
    UnexpectedValue(String),
}

impl ClassifyError {
    /// Short category name used in diagnostics and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            ClassifyError::Decode(_) => "decode",
            ClassifyError::Chain(_) => "chain",
            ClassifyError::MetadataFetch { .. } => "metadata",
            ClassifyError::MissingArgument { .. } | ClassifyError::UnexpectedValue(_) => "arguments",
        }
    }
}
