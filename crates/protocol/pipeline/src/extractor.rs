//! Metrics extraction from raw blocks.

use crate::{ChainSource, PipelineResult};
use hashprice_primitives::{BlockMetrics, RawBlock, block_subsidy};
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns a [`RawBlock`] into [`BlockMetrics`].
///
/// Extraction needs three further lookups against the chain source: the previous block (for
/// the inter-block time), the coinbase transaction (for the fees), and the network hash rate.
/// If any of them fails, no metrics are produced for the block.
#[derive(Debug, Clone)]
pub struct MetricsExtractor {
    /// The chain source used for the additional lookups.
    chain: Arc<dyn ChainSource>,
}

impl MetricsExtractor {
    /// Creates a new [`MetricsExtractor`] backed by the given chain source.
    pub fn new(chain: Arc<dyn ChainSource>) -> Self {
        Self { chain }
    }

    /// Extracts the metrics of `block`.
    pub async fn extract(&self, block: RawBlock) -> PipelineResult<BlockMetrics> {
        let height = block.height;
        let subsidy = block_subsidy(height);
        let time_delta_secs = self.time_delta(&block).await?;
        let fees = self.coinbase_output(&block).await? - subsidy;
        let network_hash_rate = self.chain.network_hash_rate(height).await?;

        if fees < 0.0 {
            warn!(target: "extractor", height, fees, "Coinbase pays less than the subsidy");
        }
        debug!(
            target: "extractor",
            height,
            subsidy,
            fees,
            network_hash_rate,
            time_delta_secs,
            "Extracted block metrics"
        );

        Ok(BlockMetrics {
            height,
            timestamp: block.time,
            subsidy,
            fees,
            network_hash_rate,
            time_delta_secs,
        })
    }

    /// Seconds between `block` and its predecessor. Zero for the genesis block.
    async fn time_delta(&self, block: &RawBlock) -> PipelineResult<f64> {
        let Some(prev_height) = block.height.checked_sub(1) else {
            return Ok(0.0);
        };
        let prev_hash = self.chain.block_hash(prev_height).await?;
        let prev = self.chain.block(&prev_hash).await?;
        Ok(block.time as f64 - prev.time as f64)
    }

    /// Sum of the coinbase transaction's outputs.
    async fn coinbase_output(&self, block: &RawBlock) -> PipelineResult<f64> {
        let Some(txid) = block.coinbase_txid() else {
            warn!(target: "extractor", height = block.height, "Block lists no coinbase transaction");
            return Ok(0.0);
        };
        let coinbase = self.chain.transaction(txid, &block.hash).await?;
        Ok(coinbase.total_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PipelineError, test_utils::TestChainSource};

    #[tokio::test]
    async fn test_extract_metrics() {
        let chain = Arc::new(TestChainSource::new(209_999..=210_001));
        chain.set_coinbase_output(210_000, vec![25.0, 0.75, 0.0]);
        chain.set_network_hash_rate(210_000, 4.2e18);
        let extractor = MetricsExtractor::new(chain.clone());

        let block = chain.raw_block(210_000).unwrap();
        let metrics = extractor.extract(block).await.unwrap();

        assert_eq!(metrics.height, 210_000);
        assert_eq!(metrics.timestamp, TestChainSource::block_time(210_000));
        assert_eq!(metrics.subsidy, 25.0);
        assert_eq!(metrics.fees, 0.75);
        assert_eq!(metrics.network_hash_rate, 4.2e18);
        assert_eq!(metrics.time_delta_secs, TestChainSource::BLOCK_INTERVAL as f64);
    }

    #[tokio::test]
    async fn test_negative_fees_are_not_clamped() {
        let chain = Arc::new(TestChainSource::new(9..=10));
        chain.set_coinbase_output(10, vec![49.5]);
        let extractor = MetricsExtractor::new(chain.clone());

        let metrics = extractor.extract(chain.raw_block(10).unwrap()).await.unwrap();
        assert_eq!(metrics.fees, 49.5 - 50.0);
    }

    #[tokio::test]
    async fn test_backwards_timestamp_gives_negative_delta() {
        let chain = Arc::new(TestChainSource::new(9..=10));
        chain.set_block_time(10, TestChainSource::block_time(9) - 30);
        let extractor = MetricsExtractor::new(chain.clone());

        let metrics = extractor.extract(chain.raw_block(10).unwrap()).await.unwrap();
        assert_eq!(metrics.time_delta_secs, -30.0);
    }

    #[tokio::test]
    async fn test_genesis_has_zero_delta() {
        let chain = Arc::new(TestChainSource::new(0..=1));
        let extractor = MetricsExtractor::new(chain.clone());

        let metrics = extractor.extract(chain.raw_block(0).unwrap()).await.unwrap();
        assert_eq!(metrics.time_delta_secs, 0.0);
        assert_eq!(metrics.subsidy, 50.0);
    }

    #[tokio::test]
    async fn test_block_without_transactions_is_recorded() {
        let chain = Arc::new(TestChainSource::new(9..=10));
        let mut block = chain.raw_block(10).unwrap();
        block.txids.clear();
        let extractor = MetricsExtractor::new(chain.clone());

        let metrics = extractor.extract(block).await.unwrap();
        assert_eq!(metrics.fees, -50.0);
    }

    #[tokio::test]
    async fn test_missing_previous_block_fails_extraction() {
        let chain = Arc::new(TestChainSource::new(10..=11));
        let extractor = MetricsExtractor::new(chain.clone());

        let err = extractor.extract(chain.raw_block(10).unwrap()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Chain(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_hash_rate_failure_fails_extraction() {
        let chain = Arc::new(TestChainSource::new(9..=10));
        chain.fail_hash_rate_at(10);
        let extractor = MetricsExtractor::new(chain.clone());

        let err = extractor.extract(chain.raw_block(10).unwrap()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Chain(_)));
    }
}
