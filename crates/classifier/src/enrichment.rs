//! Kind-specific enrichment of decoded transfer calls.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::U256;
use tracing::{debug, warn};
use tx_explorer_chain::{ChainReader, ContractHandle};

use crate::amount::{scale_amount, DEFAULT_DECIMALS};
use crate::decode::DecodedCall;
use crate::error::ClassifyError;
use crate::metadata::MetadataFetcher;
use crate::record::{Erc20Transfer, NftTransfer};

/// Resolve the token id, recipient and image of an NFT transfer.
///
/// Calls `tokenURI(tokenId)` on the collection, then fetches the metadata
/// document it points to.
pub async fn enrich_nft(
    chain: &dyn ChainReader,
    metadata: &dyn MetadataFetcher,
    contract: &ContractHandle,
    call: &DecodedCall,
) -> Result<NftTransfer, ClassifyError> {
    let token_id = call.uint("tokenId")?;
    let recipient = call.address("to")?;

    let outputs = chain
        .call_function(contract, "tokenURI", &[DynSolValue::Uint(token_id, 256)])
        .await?;
    let metadata_url = first_string(&outputs, "tokenURI")?;
    let image_url = metadata.image_url(&metadata_url).await?;

    debug!("NFT {} transferred to {}", token_id, recipient);

    Ok(NftTransfer {
        token_id,
        recipient,
        metadata_url,
        image_url,
    })
}

/// Resolve the recipient, symbol and scaled amount of an ERC-20 transfer.
///
/// `decimals()` failures fall back to 18 decimals and flag the record.
pub async fn enrich_erc20(
    chain: &dyn ChainReader,
    contract: &ContractHandle,
    call: &DecodedCall,
) -> Result<Erc20Transfer, ClassifyError> {
    let recipient = call.address("to")?;
    let raw_value = call.uint("value")?;

    let outputs = chain.call_function(contract, "symbol", &[]).await?;
    let symbol = first_string(&outputs, "symbol")?;

    let (decimals, decimals_assumed) = match token_decimals(chain, contract).await {
        Ok(decimals) => (decimals, false),
        Err(e) => {
            warn!(
                "decimals() unavailable on {}, assuming {}: {}",
                contract.address(),
                DEFAULT_DECIMALS,
                e
            );
            (DEFAULT_DECIMALS, true)
        }
    };

    let amount = scale_amount(raw_value, decimals);
    if amount.truncated {
        debug!(
            "{} {} does not fit a Decimal, truncated to {}",
            amount.formatted, symbol, amount.value
        );
    }

    Ok(Erc20Transfer {
        recipient,
        raw_value,
        formatted_value: amount.formatted,
        value: amount.value,
        value_truncated: amount.truncated,
        symbol,
        decimals,
        decimals_assumed,
    })
}

async fn token_decimals(
    chain: &dyn ChainReader,
    contract: &ContractHandle,
) -> Result<u8, ClassifyError> {
    let outputs = chain.call_function(contract, "decimals", &[]).await?;
    outputs
        .first()
        .and_then(DynSolValue::as_uint)
        .filter(|(value, _)| *value <= U256::from(u8::MAX))
        .map(|(value, _)| value.to::<u8>())
        .ok_or_else(|| ClassifyError::UnexpectedValue("decimals() output".to_string()))
}

fn first_string(outputs: &[DynSolValue], function: &str) -> Result<String, ClassifyError> {
    outputs
        .first()
        .and_then(DynSolValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClassifyError::UnexpectedValue(format!("{}() output", function)))
}
