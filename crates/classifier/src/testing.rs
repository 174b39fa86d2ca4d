//! In-memory chain and metadata fakes plus call-data builders for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::primitives::{Address, Bytes, B256, U256, U64};
use alloy::rpc::types::BlockNumberOrTag;
use async_trait::async_trait;
use tx_explorer_chain::{Block, ChainError, ChainReader, ChainResult, ContractHandle, Transaction};

use crate::error::ClassifyError;
use crate::metadata::MetadataFetcher;

/// Sender used by [`transaction`].
pub const TEST_SENDER: Address = Address::repeat_byte(0xaa);

/// A chain held in memory.
///
/// `tokenURI`, `symbol` and `decimals` answer from the configured values and
/// revert otherwise.
#[derive(Default)]
pub struct FakeChain {
    blocks: HashMap<u64, Block>,
    transactions: HashMap<B256, Transaction>,
    token_uris: HashMap<U256, String>,
    symbol: Option<String>,
    decimals: Option<u8>,
    fetched: Mutex<Vec<B256>>,
}

impl FakeChain {
    pub fn with_block(mut self, number: u64, transactions: Vec<Transaction>) -> Self {
        let block = Block {
            number: Some(U64::from(number)),
            hash: Some(B256::from(U256::from(number))),
            transactions: transactions.iter().map(|tx| tx.hash).collect(),
        };
        self.blocks.insert(number, block);
        self.transactions
            .extend(transactions.into_iter().map(|tx| (tx.hash, tx)));
        self
    }

    /// Insert a block as-is, without registering its transactions.
    pub fn with_raw_block(mut self, number: u64, block: Block) -> Self {
        self.blocks.insert(number, block);
        self
    }

    pub fn with_token_uri(mut self, token_id: U256, uri: &str) -> Self {
        self.token_uris.insert(token_id, uri.to_string());
        self
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Hashes passed to `get_transaction`, in call order.
    pub fn fetched_transactions(&self) -> Vec<B256> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

fn reverted(function: &str) -> ChainError {
    ChainError::Rpc(format!("eth_call: execution reverted ({})", function))
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn latest_block_number(&self) -> ChainResult<u64> {
        self.blocks
            .keys()
            .max()
            .copied()
            .ok_or_else(|| ChainError::Rpc("empty chain".to_string()))
    }

    async fn get_block(&self, block: BlockNumberOrTag) -> ChainResult<Block> {
        let number = match block {
            BlockNumberOrTag::Number(number) => number,
            BlockNumberOrTag::Latest => self.latest_block_number().await?,
            other => return Err(ChainError::NotFound(format!("Block {}", other))),
        };
        self.blocks
            .get(&number)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("Block {}", block)))
    }

    async fn get_transaction(&self, hash: B256) -> ChainResult<Transaction> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(hash);
        }
        self.transactions
            .get(&hash)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("Transaction {}", hash)))
    }

    async fn call_function(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[DynSolValue],
    ) -> ChainResult<Vec<DynSolValue>> {
        contract.function(function, args.len())?;

        match function {
            "tokenURI" => args
                .first()
                .and_then(DynSolValue::as_uint)
                .and_then(|(token_id, _)| self.token_uris.get(&token_id))
                .map(|uri| vec![DynSolValue::String(uri.clone())])
                .ok_or_else(|| reverted(function)),
            "symbol" => self
                .symbol
                .as_ref()
                .map(|symbol| vec![DynSolValue::String(symbol.clone())])
                .ok_or_else(|| reverted(function)),
            "decimals" => self
                .decimals
                .map(|decimals| vec![DynSolValue::Uint(U256::from(decimals), 8)])
                .ok_or_else(|| reverted(function)),
            _ => Err(reverted(function)),
        }
    }
}

/// Metadata documents keyed by URI; unknown URIs answer 404.
#[derive(Default)]
pub struct FakeMetadata {
    images: HashMap<String, String>,
}

impl FakeMetadata {
    pub fn with_image(mut self, token_uri: &str, image: &str) -> Self {
        self.images.insert(token_uri.to_string(), image.to_string());
        self
    }
}

#[async_trait]
impl MetadataFetcher for FakeMetadata {
    async fn image_url(&self, token_uri: &str) -> Result<String, ClassifyError> {
        self.images
            .get(token_uri)
            .cloned()
            .ok_or_else(|| ClassifyError::MetadataFetch {
                url: token_uri.to_string(),
                reason: "status 404 Not Found".to_string(),
            })
    }
}

/// A transaction from [`TEST_SENDER`] whose hash ends in `index`.
pub fn transaction(index: u8, to: Option<Address>, input: Vec<u8>) -> Transaction {
    Transaction {
        hash: B256::with_last_byte(index),
        from: TEST_SENDER,
        to,
        input: Bytes::from(input),
    }
}

/// ABI-encode a call (selector included) against `contract`.
pub fn encode_call(contract: &ContractHandle, function: &str, args: &[DynSolValue]) -> Vec<u8> {
    contract
        .function(function, args.len())
        .and_then(|f| {
            f.abi_encode_input(args)
                .map_err(|e| ChainError::Abi(e.to_string()))
        })
        .unwrap_or_else(|e| panic!("cannot encode {}: {}", function, e))
}

/// Call data for ERC-20 `transfer(to, value)`.
pub fn erc20_transfer_input(contract: &ContractHandle, to: Address, value: U256) -> Vec<u8> {
    encode_call(
        contract,
        "transfer",
        &[DynSolValue::Address(to), DynSolValue::Uint(value, 256)],
    )
}

/// Call data for an ERC-721 `transferFrom` or `safeTransferFrom` (with empty data).
pub fn nft_transfer_input(
    contract: &ContractHandle,
    function: &str,
    from: Address,
    to: Address,
    token_id: U256,
) -> Vec<u8> {
    let mut args = vec![
        DynSolValue::Address(from),
        DynSolValue::Address(to),
        DynSolValue::Uint(token_id, 256),
    ];
    if function == "safeTransferFrom" {
        args.push(DynSolValue::Bytes(Vec::new()));
    }
    encode_call(contract, function, &args)
}
