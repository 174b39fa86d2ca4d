//! Read-only access to an Ethereum-compatible node over JSON-RPC.

pub mod contract;
pub mod error;
pub mod reader;
pub mod rpc_client;
pub mod types;

pub use alloy::rpc::types::BlockNumberOrTag;
pub use contract::ContractHandle;
pub use error::{ChainError, ChainResult};
pub use reader::ChainReader;
pub use rpc_client::ChainClient;
pub use types::{Block, Transaction};
