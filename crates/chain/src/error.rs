//! Errors raised by chain reads.

/// Error type for chain operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("Cannot reach node at {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("Contract ABI error: {0}")]
    Abi(String),
}

impl ChainError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChainError::NotFound(_))
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
