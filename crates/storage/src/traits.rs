use crate::StorageError;
use hashprice_primitives::{
    BlockMetrics, HardwareProfile, PriceQuote, PricedBlock, RevenueAllocation,
};
use std::fmt::Debug;

/// Everything persisted for one block height, written atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightCommit {
    /// The enriched block: metrics and price quote.
    pub block: PricedBlock,
    /// One allocation per hardware profile. May be empty.
    pub allocations: Vec<RevenueAllocation>,
}

impl HeightCommit {
    /// The height being committed.
    pub const fn height(&self) -> u64 {
        self.block.metrics.height
    }
}

/// Provides read access to the block metrics and price quote series.
pub trait BlockStorageReader {
    /// Returns the highest committed height, or `None` if nothing was committed yet.
    fn latest_height(&self) -> Result<Option<u64>, StorageError>;

    /// Gets the [`BlockMetrics`] committed at `height`.
    ///
    /// # Returns
    /// * `Err(StorageError::EntryNotFound)` if the height was never committed.
    fn block_metrics(&self, height: u64) -> Result<BlockMetrics, StorageError>;

    /// Gets the [`PriceQuote`] committed at `height`.
    ///
    /// # Returns
    /// * `Err(StorageError::EntryNotFound)` if the height was never committed.
    fn price_quote(&self, height: u64) -> Result<PriceQuote, StorageError>;

    /// Returns every committed block whose timestamp lies in `[from, to]`, in height order.
    fn priced_blocks_in_range(&self, from: u64, to: u64) -> Result<Vec<PricedBlock>, StorageError>;
}

/// Provides write access to the per-height series.
///
/// Implementations must make a [`HeightCommit`] all-or-nothing and must only accept the
/// height immediately following the latest committed one, so committed heights stay
/// contiguous. The first commit into an empty store may use any height.
pub trait BlockStorageWriter {
    /// Atomically persists the metrics, quote, and allocations of one height.
    ///
    /// # Returns
    /// * `Err(StorageError::ConflictError)` if the height does not extend the committed range.
    fn commit_height(&self, commit: HeightCommit) -> Result<(), StorageError>;
}

/// Provides access to the hardware profile reference data.
pub trait HardwareProfileStorage {
    /// Returns every stored profile, ordered by identifier.
    fn hardware_profiles(&self) -> Result<Vec<HardwareProfile>, StorageError>;

    /// Inserts or overwrites the given profiles.
    fn upsert_hardware_profiles(&self, profiles: &[HardwareProfile]) -> Result<(), StorageError>;
}

/// Provides read access to the revenue allocation series.
pub trait RevenueStorageReader {
    /// Returns the allocations committed at `height`, ordered by profile identifier.
    fn allocations_at(&self, height: u64) -> Result<Vec<RevenueAllocation>, StorageError>;

    /// Returns the allocations of `profile_id` whose timestamp lies in `[from, to]`, in height
    /// order.
    fn allocations_in_range(
        &self,
        profile_id: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<RevenueAllocation>, StorageError>;
}

/// The full storage surface the pipeline needs.
pub trait PipelineStorage:
    BlockStorageReader
    + BlockStorageWriter
    + HardwareProfileStorage
    + RevenueStorageReader
    + Send
    + Sync
    + Debug
{
}

impl<T> PipelineStorage for T where
    T: BlockStorageReader
        + BlockStorageWriter
        + HardwareProfileStorage
        + RevenueStorageReader
        + Send
        + Sync
        + Debug
{
}
