//! Contract handles: an address bound to its parsed ABI.

use std::path::Path;
use std::sync::Arc;

use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::Address;

use crate::error::{ChainError, ChainResult};

/// A deployed contract and the interface used to talk to it.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    label: String,
    address: Address,
    abi: Arc<JsonAbi>,
}

impl ContractHandle {
    pub fn new(label: impl Into<String>, address: Address, abi: JsonAbi) -> Self {
        Self {
            label: label.into(),
            address,
            abi: Arc::new(abi),
        }
    }

    /// Parse a JSON ABI document and bind it to `address`.
    pub fn from_json(label: impl Into<String>, address: Address, abi_json: &str) -> ChainResult<Self> {
        let abi: JsonAbi = serde_json::from_str(abi_json)
            .map_err(|e| ChainError::Abi(format!("invalid ABI document: {}", e)))?;
        Ok(Self::new(label, address, abi))
    }

    /// Read a JSON ABI document from disk and bind it to `address`.
    pub fn from_file(
        label: impl Into<String>,
        address: Address,
        path: impl AsRef<Path>,
    ) -> ChainResult<Self> {
        let path = path.as_ref();
        let abi_json = std::fs::read_to_string(path)
            .map_err(|e| ChainError::Abi(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(label, address, &abi_json)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Look up a function by name and argument count (overloads are common in ERC-721).
    pub fn function(&self, name: &str, arity: usize) -> ChainResult<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
            .ok_or_else(|| {
                ChainError::Abi(format!(
                    "{} has no function {} taking {} argument(s)",
                    self.label, name, arity
                ))
            })
    }

    /// Find the function whose 4-byte selector equals `selector`.
    pub fn function_by_selector(&self, selector: &[u8]) -> Option<&Function> {
        self.abi
            .functions()
            .find(|f| f.selector().as_slice() == selector)
    }
}
