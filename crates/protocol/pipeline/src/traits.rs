//! External data sources consumed by the pipeline.

use crate::{ChainSourceError, PriceSourceError};
use async_trait::async_trait;
use hashprice_primitives::{
    BlockHash, CurrencyPair, PricePoint, RawBlock, RawTransaction, Txid,
};
use std::fmt::Debug;

/// Query interface of the chain data source.
///
/// The main reason this trait exists is to decouple the pipeline from the node's transport,
/// and to allow mocking in tests.
#[async_trait]
pub trait ChainSource: Send + Sync + Debug {
    /// Returns the height of the current chain tip.
    async fn tip_height(&self) -> Result<u64, ChainSourceError>;

    /// Returns the hash of the block at `height` on the active chain.
    async fn block_hash(&self, height: u64) -> Result<BlockHash, ChainSourceError>;

    /// Fetches the block with the given hash.
    async fn block(&self, hash: &BlockHash) -> Result<RawBlock, ChainSourceError>;

    /// Fetches a transaction contained in the block `block_hash`.
    async fn transaction(
        &self,
        txid: &Txid,
        block_hash: &BlockHash,
    ) -> Result<RawTransaction, ChainSourceError>;

    /// Returns the source's windowed-average network hash rate at `height`, in H/s.
    async fn network_hash_rate(&self, height: u64) -> Result<f64, ChainSourceError>;
}

/// Query interface of the historical price source.
#[async_trait]
pub trait PriceSource: Send + Sync + Debug {
    /// Returns the samples of `pair` between `from` and `to` (inclusive, seconds since the
    /// Unix epoch), in the order the source reports them.
    async fn price_range(
        &self,
        pair: &CurrencyPair,
        from: u64,
        to: u64,
    ) -> Result<Vec<PricePoint>, PriceSourceError>;
}
