//! ABI decoding of transaction call data.

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::primitives::{Address, U256};
use serde::Serialize;
use tracing::trace;
use tx_explorer_chain::ContractHandle;

use crate::error::{ClassifyError, DecodeError};

/// A function call decoded against a contract ABI.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    /// Function name, e.g. `safeTransferFrom`.
    pub function: String,
    /// Full signature, e.g. `safeTransferFrom(address,address,uint256)`.
    pub signature: String,
    /// Arguments in declaration order; unnamed parameters become `arg{n}`.
    pub params: Vec<(String, DynSolValue)>,
}

impl DecodedCall {
    pub fn get(&self, name: &str) -> Option<&DynSolValue> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    fn require(&self, name: &str) -> Result<&DynSolValue, ClassifyError> {
        self.get(name).ok_or_else(|| ClassifyError::MissingArgument {
            function: self.signature.clone(),
            argument: name.to_string(),
        })
    }

    /// Arguments rendered for display.
    pub fn arguments(&self) -> Vec<CallArgument> {
        self.params
            .iter()
            .map(|(name, value)| CallArgument {
                name: name.clone(),
                value: format_value(value),
            })
            .collect()
    }

    /// Fetch an unsigned integer argument.
    pub fn uint(&self, name: &str) -> Result<U256, ClassifyError> {
        self.require(name)?
            .as_uint()
            .map(|(value, _bits)| value)
            .ok_or_else(|| ClassifyError::UnexpectedValue(format!("{} (expected uint)", name)))
    }

    /// Fetch an address argument.
    pub fn address(&self, name: &str) -> Result<Address, ClassifyError> {
        self.require(name)?
            .as_address()
            .ok_or_else(|| ClassifyError::UnexpectedValue(format!("{} (expected address)", name)))
    }
}

/// Decode call data against the contract's ABI.
///
/// The leading 4 bytes select the function; the remainder is decoded per the
/// function's parameter list.
///
/// # Arguments
/// * `contract` - Contract whose ABI describes the call
/// * `input` - Complete call data including the selector
pub fn decode_call(contract: &ContractHandle, input: &[u8]) -> Result<DecodedCall, DecodeError> {
    if input.len() < 4 {
        return Err(DecodeError::InputTooShort(input.len()));
    }

    let (selector, data) = input.split_at(4);
    let function = contract
        .function_by_selector(selector)
        .ok_or_else(|| DecodeError::UnknownSelector(format!("0x{}", hex::encode(selector))))?;

    let signature = function.signature();
    let values = function
        .abi_decode_input(data, true)
        .map_err(|e| DecodeError::Malformed {
            function: signature.clone(),
            reason: e.to_string(),
        })?;

    let params = function
        .inputs
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (param, value))| {
            let name = if param.name.is_empty() {
                format!("arg{}", index)
            } else {
                param.name.clone()
            };
            (name, value)
        })
        .collect::<Vec<_>>();

    trace!("Decoded {} with {} parameters", signature, params.len());

    Ok(DecodedCall {
        function: function.name.clone(),
        signature,
        params,
    })
}

/// Render a decoded value for display.
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(address) => address.to_checksum(None),
        DynSolValue::Uint(value, _) => value.to_string(),
        DynSolValue::Int(value, _) => value.to_string(),
        DynSolValue::Bool(value) => value.to_string(),
        DynSolValue::String(value) => value.clone(),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        other => format!("{:?}", other),
    }
}

/// A `(name, rendered value)` view of the call, for output.
#[derive(Debug, Clone, Serialize)]
pub struct CallArgument {
    pub name: String,
    pub value: String,
}
