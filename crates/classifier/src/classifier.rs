//! Transaction classification: destination filtering, decoding and enrichment.

use std::sync::Arc;

use tracing::{debug, info, warn};
use tx_explorer_chain::{ChainReader, ContractHandle, Transaction};
use tx_explorer_telemetry::Metrics;

use crate::decode::decode_call;
use crate::enrichment::{enrich_erc20, enrich_nft};
use crate::error::ClassifyError;
use crate::metadata::MetadataFetcher;
use crate::record::{
    Classification, ClassificationFailure, EnrichedTransactionRecord, TransferDetails,
    TransferKind,
};

/// Number of leading block transactions inspected unless configured otherwise.
pub const DEFAULT_SCAN_LIMIT: usize = 17;

/// Classifier turning raw transactions into enriched transfer records.
pub struct TransactionClassifier {
    chain: Arc<dyn ChainReader>,
    metadata: Arc<dyn MetadataFetcher>,
    metrics: Metrics,
    scan_limit: Option<usize>,
}

impl TransactionClassifier {
    /// Create a new classifier.
    ///
    /// # Arguments
    /// * `chain` - Chain reader used for `tokenURI`, `symbol` and `decimals` calls
    /// * `metadata` - Off-chain NFT metadata fetcher
    /// * `metrics` - Metrics collector
    /// * `scan_limit` - Maximum transactions inspected per call; `None` inspects all
    pub fn new(
        chain: Arc<dyn ChainReader>,
        metadata: Arc<dyn MetadataFetcher>,
        metrics: Metrics,
        scan_limit: Option<usize>,
    ) -> Self {
        Self {
            chain,
            metadata,
            metrics,
            scan_limit,
        }
    }

    pub fn scan_limit(&self) -> Option<usize> {
        self.scan_limit
    }

    /// The leading slice of `transactions` this classifier will inspect.
    pub fn window<'a, T>(&self, transactions: &'a [T]) -> &'a [T] {
        match self.scan_limit {
            Some(limit) => &transactions[..transactions.len().min(limit)],
            None => transactions,
        }
    }

    /// Classify transactions sent to `contract`.
    ///
    /// Transactions are handled one at a time in block order. Those addressed
    /// elsewhere are skipped; those that fail to decode or enrich are listed in
    /// `Classification::failures` and do not stop the run.
    ///
    /// # Arguments
    /// * `transactions` - Block transactions in block order
    /// * `contract` - Target contract; its ABI decodes the call data
    /// * `kind` - Enrichment to apply to matching transactions
    pub async fn classify(
        &self,
        transactions: &[Transaction],
        contract: &ContractHandle,
        kind: TransferKind,
    ) -> Classification {
        let window = self.window(transactions);
        let mut classification = Classification {
            inspected: window.len(),
            ..Default::default()
        };

        for (position, tx) in window.iter().enumerate() {
            if tx.is_contract_creation() || tx.to != Some(contract.address()) {
                continue;
            }

            match self.classify_transaction(position, tx, contract, kind).await {
                Ok(record) => {
                    debug!("Classified {} at position {} as {}", tx.hash, position, kind);
                    classification.records.push(record);
                }
                Err(e) => {
                    warn!("Failed to classify transaction {} at position {}: {}", tx.hash, position, e);
                    classification.failures.push(ClassificationFailure {
                        position,
                        tx_hash: tx.hash,
                        category: e.category(),
                        error: e,
                    });
                }
            }
        }

        self.metrics
            .inc_transactions_inspected(classification.inspected as u64);
        self.metrics
            .inc_records_classified(kind.as_str(), classification.records.len() as u64);
        self.metrics
            .inc_classification_failures(kind.as_str(), classification.failures.len() as u64);

        info!(
            "Classified {} of {} transactions as {} transfers to {} ({} failed)",
            classification.records.len(),
            classification.inspected,
            kind,
            contract.address(),
            classification.failures.len()
        );

        classification
    }

    async fn classify_transaction(
        &self,
        position: usize,
        tx: &Transaction,
        contract: &ContractHandle,
        kind: TransferKind,
    ) -> Result<EnrichedTransactionRecord, ClassifyError> {
        let call = decode_call(contract, &tx.input)?;

        let details = match kind {
            TransferKind::Nft => TransferDetails::Nft(
                enrich_nft(self.chain.as_ref(), self.metadata.as_ref(), contract, &call).await?,
            ),
            TransferKind::Erc20 => {
                TransferDetails::Erc20(enrich_erc20(self.chain.as_ref(), contract, &call).await?)
            }
        };

        Ok(EnrichedTransactionRecord::new(position, tx, contract, &call, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{erc20_contract, nft_contract, DEFAULT_ERC20_ADDRESS, DEFAULT_NFT_ADDRESS};
    use crate::error::DecodeError;
    use crate::testing::{
        encode_call, erc20_transfer_input, nft_transfer_input, transaction, FakeChain,
        FakeMetadata,
    };
    use alloy::dyn_abi::DynSolValue;
    use alloy::primitives::{Address, U256};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn classifier(chain: FakeChain, metadata: FakeMetadata, limit: Option<usize>) -> TransactionClassifier {
        TransactionClassifier::new(
            Arc::new(chain),
            Arc::new(metadata),
            Metrics::new().unwrap(),
            limit,
        )
    }

    fn other_contract_tx(index: u8) -> Transaction {
        transaction(index, Some(Address::repeat_byte(0xee)), vec![0xa9, 0x05, 0x9c, 0xbb])
    }

    #[tokio::test]
    async fn no_matching_transactions_yields_nothing() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let txs: Vec<_> = (0..5).map(other_contract_tx).collect();

        let result = classifier(FakeChain::default(), FakeMetadata::default(), Some(17))
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        assert!(result.is_empty());
        assert_eq!(result.inspected, 5);
    }

    #[tokio::test]
    async fn other_destinations_are_skipped_even_with_valid_call_data() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let input = erc20_transfer_input(&erc20, Address::repeat_byte(0x11), U256::from(1u8));
        let txs = vec![
            transaction(0, Some(Address::repeat_byte(0xee)), input.clone()),
            transaction(1, None, input.clone()),
            transaction(2, Some(DEFAULT_ERC20_ADDRESS), input),
        ];
        let chain = FakeChain::default().with_symbol("AE").with_decimals(18);

        let result = classifier(chain, FakeMetadata::default(), Some(17))
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].position, 2);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn erc20_transfer_is_scaled_by_reported_decimals() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let raw = U256::from(2_500_000_000_000_000_000u128);
        let txs = vec![transaction(
            0,
            Some(DEFAULT_ERC20_ADDRESS),
            erc20_transfer_input(&erc20, Address::repeat_byte(0x11), raw),
        )];
        let chain = FakeChain::default().with_symbol("AE").with_decimals(18);

        let result = classifier(chain, FakeMetadata::default(), Some(17))
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        let record = &result.records[0];
        let transfer = record.as_erc20().unwrap();
        assert_eq!(record.function, "transfer");
        assert_eq!(transfer.value, Decimal::from_str("2.5").unwrap());
        assert_eq!(transfer.raw_value, raw);
        assert_eq!(transfer.symbol, "AE");
        assert_eq!(transfer.recipient, Address::repeat_byte(0x11));
        assert!(!transfer.decimals_assumed);
        assert!(!transfer.value_truncated);
    }

    #[tokio::test]
    async fn missing_decimals_falls_back_to_18_and_is_flagged() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let txs = vec![transaction(
            0,
            Some(DEFAULT_ERC20_ADDRESS),
            erc20_transfer_input(&erc20, Address::repeat_byte(0x11), U256::from(10u8).pow(U256::from(18u8))),
        )];
        let chain = FakeChain::default().with_symbol("AE");

        let result = classifier(chain, FakeMetadata::default(), Some(17))
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        let transfer = result.records[0].as_erc20().unwrap();
        assert_eq!(transfer.decimals, 18);
        assert!(transfer.decimals_assumed);
        assert_eq!(transfer.value, Decimal::ONE);
    }

    #[tokio::test]
    async fn amounts_beyond_decimal_precision_keep_exact_text() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let raw = U256::from_str("123456789012345678901234567891").unwrap();
        let txs = vec![transaction(
            0,
            Some(DEFAULT_ERC20_ADDRESS),
            erc20_transfer_input(&erc20, Address::repeat_byte(0x11), raw),
        )];
        let chain = FakeChain::default().with_symbol("MEME").with_decimals(18);

        let result = classifier(chain, FakeMetadata::default(), None)
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        let transfer = result.records[0].as_erc20().unwrap();
        assert_eq!(transfer.formatted_value, "123456789012.345678901234567891");
        assert_eq!(transfer.value, Decimal::from_str("123456789012.34567890123456789").unwrap());
        assert!(transfer.value_truncated);
    }

    #[tokio::test]
    async fn six_decimal_tokens_scale_correctly() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let txs = vec![transaction(
            0,
            Some(DEFAULT_ERC20_ADDRESS),
            erc20_transfer_input(&erc20, Address::repeat_byte(0x11), U256::from(1_250_000u64)),
        )];
        let chain = FakeChain::default().with_symbol("USDC").with_decimals(6);

        let result = classifier(chain, FakeMetadata::default(), None)
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        assert_eq!(
            result.records[0].as_erc20().unwrap().value,
            Decimal::from_str("1.25").unwrap()
        );
    }

    #[tokio::test]
    async fn nft_transfer_resolves_image() {
        let nft = nft_contract(DEFAULT_NFT_ADDRESS, None).unwrap();
        let txs = vec![transaction(
            0,
            Some(DEFAULT_NFT_ADDRESS),
            nft_transfer_input(
                &nft,
                "transferFrom",
                Address::repeat_byte(0x22),
                Address::repeat_byte(0x11),
                U256::from(42u8),
            ),
        )];
        let chain = FakeChain::default().with_token_uri(U256::from(42u8), "https://x/42.json");
        let metadata = FakeMetadata::default().with_image("https://x/42.json", "https://x/42.png");

        let result = classifier(chain, metadata, Some(17))
            .classify(&txs, &nft, TransferKind::Nft)
            .await;

        let transfer = result.records[0].as_nft().unwrap();
        assert_eq!(transfer.token_id, U256::from(42u8));
        assert_eq!(transfer.image_url, "https://x/42.png");
        assert_eq!(transfer.metadata_url, "https://x/42.json");
        assert_eq!(transfer.recipient, Address::repeat_byte(0x11));
    }

    #[tokio::test]
    async fn decode_failure_is_reported_without_aborting_the_batch() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let good = erc20_transfer_input(&erc20, Address::repeat_byte(0x11), U256::from(1u8));
        let txs = vec![
            transaction(0, Some(DEFAULT_ERC20_ADDRESS), vec![0xde, 0xad, 0xbe, 0xef]),
            transaction(1, Some(DEFAULT_ERC20_ADDRESS), good),
        ];
        let chain = FakeChain::default().with_symbol("AE").with_decimals(18);

        let result = classifier(chain, FakeMetadata::default(), Some(17))
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].position, 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].position, 0);
        assert_eq!(result.failures[0].category, "decode");
        assert_eq!(
            result.failures[0].error,
            ClassifyError::Decode(DecodeError::UnknownSelector("0xdeadbeef".to_string()))
        );
    }

    #[tokio::test]
    async fn metadata_failure_is_isolated() {
        let nft = nft_contract(DEFAULT_NFT_ADDRESS, None).unwrap();
        let transfer = |token: u8| {
            nft_transfer_input(
                &nft,
                "safeTransferFrom",
                Address::repeat_byte(0x22),
                Address::repeat_byte(0x11),
                U256::from(token),
            )
        };
        let txs = vec![
            transaction(0, Some(DEFAULT_NFT_ADDRESS), transfer(1)),
            transaction(1, Some(DEFAULT_NFT_ADDRESS), transfer(2)),
        ];
        let chain = FakeChain::default()
            .with_token_uri(U256::from(1u8), "https://x/1.json")
            .with_token_uri(U256::from(2u8), "https://x/2.json");
        let metadata = FakeMetadata::default().with_image("https://x/2.json", "https://x/2.png");

        let result = classifier(chain, metadata, Some(17))
            .classify(&txs, &nft, TransferKind::Nft)
            .await;

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].as_nft().unwrap().image_url, "https://x/2.png");
        assert_eq!(result.failures[0].category, "metadata");
    }

    #[tokio::test]
    async fn approvals_lack_required_arguments() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let input = encode_call(
            &erc20,
            "approve",
            &[
                DynSolValue::Address(Address::repeat_byte(0x11)),
                DynSolValue::Uint(U256::from(5u8), 256),
            ],
        );
        let txs = vec![transaction(0, Some(DEFAULT_ERC20_ADDRESS), input)];

        let result = classifier(FakeChain::default().with_symbol("AE"), FakeMetadata::default(), None)
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        assert!(result.records.is_empty());
        assert_eq!(result.failures[0].category, "arguments");
    }

    #[tokio::test]
    async fn only_the_scan_window_is_inspected() {
        let erc20 = erc20_contract(DEFAULT_ERC20_ADDRESS, None).unwrap();
        let input = erc20_transfer_input(&erc20, Address::repeat_byte(0x11), U256::from(1u8));
        let txs: Vec<_> = (0..=255u8)
            .map(|i| transaction(i, Some(DEFAULT_ERC20_ADDRESS), input.clone()))
            .collect();
        let chain = FakeChain::default().with_symbol("AE").with_decimals(18);

        let result = classifier(chain, FakeMetadata::default(), Some(DEFAULT_SCAN_LIMIT))
            .classify(&txs, &erc20, TransferKind::Erc20)
            .await;

        assert_eq!(result.inspected, 17);
        assert_eq!(result.records.len(), 17);
        let positions: Vec<_> = result.records.iter().map(|r| r.position).collect();
        assert_eq!(positions, (0..17).collect::<Vec<_>>());
    }
}
