//! A scripted chain for testing.

use crate::{ChainSource, ChainSourceError};
use async_trait::async_trait;
use hashprice_primitives::{BlockHash, RawBlock, RawTransaction, Txid, block_subsidy};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    ops::RangeInclusive,
    sync::{Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct ChainState {
    tip: u64,
    blocks: BTreeMap<u64, RawBlock>,
    coinbase_outputs: HashMap<u64, Vec<f64>>,
    hash_rates: HashMap<u64, f64>,
    failing_blocks: HashSet<u64>,
    failing_hash_rates: HashSet<u64>,
    fetched: Vec<u64>,
}

/// A [`ChainSource`] serving a contiguous range of synthetic blocks.
///
/// Block `h` has hash `{h:064x}`, a single coinbase transaction `cb{h}`, and timestamp
/// [`TestChainSource::block_time`]. Unless overridden, the coinbase pays the subsidy plus
/// [`TestChainSource::DEFAULT_FEES`] and the network hash rate is
/// [`TestChainSource::DEFAULT_NETWORK_HASH_RATE`].
#[derive(Debug, Default)]
pub struct TestChainSource {
    state: Mutex<ChainState>,
}

impl TestChainSource {
    /// Seconds between consecutive synthetic blocks.
    pub const BLOCK_INTERVAL: u64 = 600;
    /// Timestamp of height zero.
    pub const GENESIS_TIME: u64 = 1_231_006_505;
    /// Fees paid by every block without an explicit coinbase.
    pub const DEFAULT_FEES: f64 = 0.25;
    /// Network hash rate reported for every height without an explicit value.
    pub const DEFAULT_NETWORK_HASH_RATE: f64 = 6.0e20;

    /// Creates a chain holding the blocks in `range`. The range end is the tip.
    pub fn new(range: RangeInclusive<u64>) -> Self {
        let (first, tip) = range.into_inner();
        let blocks = (first..=tip).map(|height| (height, Self::make_block(height, tip))).collect();
        Self { state: Mutex::new(ChainState { tip, blocks, ..Default::default() }) }
    }

    /// The hash of the block at `height`.
    pub fn hash_of(height: u64) -> BlockHash {
        format!("{height:064x}")
    }

    /// The default timestamp of the block at `height`.
    pub const fn block_time(height: u64) -> u64 {
        Self::GENESIS_TIME + height * Self::BLOCK_INTERVAL
    }

    fn make_block(height: u64, tip: u64) -> RawBlock {
        RawBlock {
            height,
            hash: Self::hash_of(height),
            time: Self::block_time(height),
            txids: vec![format!("cb{height}")],
            next_hash: (height < tip).then(|| Self::hash_of(height + 1)),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mines blocks up to `tip`, linking the previous tip to its new successor.
    pub fn extend_to(&self, tip: u64) {
        let mut state = self.state();
        let old_tip = state.tip;
        if tip <= old_tip {
            return;
        }
        if let Some(block) = state.blocks.get_mut(&old_tip) {
            block.next_hash = Some(Self::hash_of(old_tip + 1));
        }
        for height in old_tip + 1..=tip {
            state.blocks.insert(height, Self::make_block(height, tip));
        }
        state.tip = tip;
    }

    /// Returns a copy of the block at `height`.
    pub fn raw_block(&self, height: u64) -> Option<RawBlock> {
        self.state().blocks.get(&height).cloned()
    }

    /// Overrides the timestamp of the block at `height`.
    pub fn set_block_time(&self, height: u64, time: u64) {
        if let Some(block) = self.state().blocks.get_mut(&height) {
            block.time = time;
        }
    }

    /// Overrides the coinbase outputs of the block at `height`.
    pub fn set_coinbase_output(&self, height: u64, outputs: Vec<f64>) {
        self.state().coinbase_outputs.insert(height, outputs);
    }

    /// Overrides the network hash rate reported at `height`.
    pub fn set_network_hash_rate(&self, height: u64, hash_rate: f64) {
        self.state().hash_rates.insert(height, hash_rate);
    }

    /// Makes fetching the block at `height` fail with a transport error.
    pub fn fail_block_at(&self, height: u64) {
        self.state().failing_blocks.insert(height);
    }

    /// Makes the hash rate lookup at `height` fail with a transport error.
    pub fn fail_hash_rate_at(&self, height: u64) {
        self.state().failing_hash_rates.insert(height);
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_blocks.clear();
        state.failing_hash_rates.clear();
    }

    /// Heights of every block fetched by hash, in fetch order.
    pub fn fetched_blocks(&self) -> Vec<u64> {
        self.state().fetched.clone()
    }
}

#[async_trait]
impl ChainSource for TestChainSource {
    async fn tip_height(&self) -> Result<u64, ChainSourceError> {
        Ok(self.state().tip)
    }

    async fn block_hash(&self, height: u64) -> Result<BlockHash, ChainSourceError> {
        self.state()
            .blocks
            .get(&height)
            .map(|block| block.hash.clone())
            .ok_or_else(|| ChainSourceError::BlockNotFound(format!("height {height}")))
    }

    async fn block(&self, hash: &BlockHash) -> Result<RawBlock, ChainSourceError> {
        let mut state = self.state();
        let block = state
            .blocks
            .values()
            .find(|block| &block.hash == hash)
            .cloned()
            .ok_or_else(|| ChainSourceError::BlockNotFound(hash.clone()))?;
        if state.failing_blocks.contains(&block.height) {
            return Err(ChainSourceError::Transport(format!("connection reset at {}", block.height)));
        }
        state.fetched.push(block.height);
        Ok(block)
    }

    async fn transaction(
        &self,
        txid: &Txid,
        block_hash: &BlockHash,
    ) -> Result<RawTransaction, ChainSourceError> {
        let state = self.state();
        let block = state
            .blocks
            .values()
            .find(|block| &block.hash == block_hash)
            .ok_or_else(|| ChainSourceError::BlockNotFound(block_hash.clone()))?;
        if !block.txids.contains(txid) {
            return Err(ChainSourceError::Rpc {
                code: -5,
                message: format!("no such transaction {txid} in block {block_hash}"),
            });
        }
        let output_values = state
            .coinbase_outputs
            .get(&block.height)
            .cloned()
            .unwrap_or_else(|| vec![block_subsidy(block.height) + Self::DEFAULT_FEES]);
        Ok(RawTransaction { txid: txid.clone(), output_values })
    }

    async fn network_hash_rate(&self, height: u64) -> Result<f64, ChainSourceError> {
        let state = self.state();
        if state.failing_hash_rates.contains(&height) {
            return Err(ChainSourceError::Transport(format!("timeout at {height}")));
        }
        Ok(state.hash_rates.get(&height).copied().unwrap_or(Self::DEFAULT_NETWORK_HASH_RATE))
    }
}
