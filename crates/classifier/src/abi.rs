//! Contract interfaces shipped with the explorer.
//!
//! Both documents are embedded at compile time and can be replaced at startup
//! by ABI files on disk.

use std::path::Path;

use alloy::primitives::{address, Address};
use tx_explorer_chain::{ChainResult, ContractHandle};

/// ERC-721 interface (transfers, approvals, `tokenURI`).
pub const ERC721_ABI_JSON: &str = include_str!("../abi/erc721.json");

/// ERC-20 interface (transfers, approvals, `symbol`, `decimals`).
pub const ERC20_ABI_JSON: &str = include_str!("../abi/erc20.json");

/// Murakami.Flowers NFT collection.
pub const DEFAULT_NFT_ADDRESS: Address = address!("7D8820FA92EB1584636f4F5b8515B5476B75171a");

/// Aeternity ERC-20 token.
pub const DEFAULT_ERC20_ADDRESS: Address = address!("5CA9a71B1d01849C0a95490Cc00559717fCF0D1d");

/// Bind the ERC-721 interface to `address`, reading it from `abi_path` when given.
pub fn nft_contract(address: Address, abi_path: Option<&Path>) -> ChainResult<ContractHandle> {
    load("nft", address, abi_path, ERC721_ABI_JSON)
}

/// Bind the ERC-20 interface to `address`, reading it from `abi_path` when given.
pub fn erc20_contract(address: Address, abi_path: Option<&Path>) -> ChainResult<ContractHandle> {
    load("erc20", address, abi_path, ERC20_ABI_JSON)
}

fn load(
    label: &str,
    address: Address,
    abi_path: Option<&Path>,
    embedded: &str,
) -> ChainResult<ContractHandle> {
    match abi_path {
        Some(path) => ContractHandle::from_file(label, address, path),
        None => ContractHandle::from_json(label, address, embedded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_interfaces_parse() {
        let nft = nft_contract(DEFAULT_NFT_ADDRESS, None).unwrap();
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();

        assert!(nft.function("tokenURI", 1).is_ok());
        assert!(nft.function("safeTransferFrom", 4).is_ok());
        assert!(erc20.function("symbol", 0).is_ok());
        assert!(erc20.function("decimals", 0).is_ok());
    }

    #[test]
    fn default_addresses_are_checksummed() {
        assert_eq!(
            DEFAULT_NFT_ADDRESS.to_checksum(None),
            "0x7D8820FA92EB1584636f4F5b8515B5476B75171a"
        );
        assert_eq!(
            DEFAULT_ERC20_ADDRESS.to_checksum(None),
            "0x5CA9a71B1d01849C0a95490Cc00559717fCF0D1d"
        );
    }

    #[test]
    fn missing_abi_file_is_an_error() {
        let err = erc20_contract(DEFAULT_ERC20_ADDRESS, Some(Path::new("/nonexistent/erc20.json")))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/erc20.json"));
    }
}
