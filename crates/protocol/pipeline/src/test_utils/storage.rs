//! In-memory storage for testing.

use hashprice_primitives::{
    BlockMetrics, HardwareProfile, PriceQuote, PricedBlock, RevenueAllocation,
};
use hashprice_storage::{
    BlockStorageReader, BlockStorageWriter, HardwareProfileStorage, HeightCommit,
    RevenueStorageReader, StorageError,
};
use std::{
    collections::{BTreeMap, HashSet},
    sync::{Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct MemoryState {
    blocks: BTreeMap<u64, PricedBlock>,
    allocations: BTreeMap<(u64, String), RevenueAllocation>,
    profiles: BTreeMap<String, HardwareProfile>,
    failing_commits: HashSet<u64>,
    writes: usize,
}

/// A storage backend holding everything in memory, with the same contiguity rules as the
/// database.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    state: Mutex<MemoryState>,
}

impl InMemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store holding `profiles`.
    pub fn with_profiles(profiles: &[HardwareProfile]) -> Self {
        let storage = Self::default();
        storage.state().profiles =
            profiles.iter().map(|profile| (profile.id.clone(), profile.clone())).collect();
        storage
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of successful write operations so far.
    pub fn writes(&self) -> usize {
        self.state().writes
    }

    /// Every committed height, in order.
    pub fn heights(&self) -> Vec<u64> {
        self.state().blocks.keys().copied().collect()
    }

    /// Makes the commit of `height` fail with a database error.
    pub fn fail_commit_at(&self, height: u64) {
        self.state().failing_commits.insert(height);
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        self.state().failing_commits.clear();
    }
}

impl BlockStorageReader for InMemoryStorage {
    fn latest_height(&self) -> Result<Option<u64>, StorageError> {
        Ok(self.state().blocks.keys().next_back().copied())
    }

    fn block_metrics(&self, height: u64) -> Result<BlockMetrics, StorageError> {
        self.state()
            .blocks
            .get(&height)
            .map(|block| block.metrics.clone())
            .ok_or_else(|| StorageError::EntryNotFound(format!("block metrics at height {height}")))
    }

    fn price_quote(&self, height: u64) -> Result<PriceQuote, StorageError> {
        self.state()
            .blocks
            .get(&height)
            .map(|block| block.quote)
            .ok_or_else(|| StorageError::EntryNotFound(format!("price quote at height {height}")))
    }

    fn priced_blocks_in_range(&self, from: u64, to: u64) -> Result<Vec<PricedBlock>, StorageError> {
        Ok(self
            .state()
            .blocks
            .values()
            .filter(|block| (from..=to).contains(&block.metrics.timestamp))
            .cloned()
            .collect())
    }
}

impl BlockStorageWriter for InMemoryStorage {
    fn commit_height(&self, commit: HeightCommit) -> Result<(), StorageError> {
        let mut state = self.state();
        let height = commit.height();
        if state.failing_commits.contains(&height) {
            return Err(StorageError::Database(format!("injected failure at {height}")));
        }
        if let Some(latest) = state.blocks.keys().next_back().copied() &&
            latest.checked_add(1) != Some(height)
        {
            return Err(StorageError::ConflictError(format!(
                "height {height} does not follow latest committed height {latest}"
            )));
        }
        if commit.block.quote.height != height ||
            commit.allocations.iter().any(|allocation| allocation.height != height)
        {
            return Err(StorageError::ConflictError(format!("rows for another height in {height}")));
        }

        for allocation in commit.allocations {
            state.allocations.insert((height, allocation.profile_id.clone()), allocation);
        }
        state.blocks.insert(height, commit.block);
        state.writes += 1;
        Ok(())
    }
}

impl HardwareProfileStorage for InMemoryStorage {
    fn hardware_profiles(&self) -> Result<Vec<HardwareProfile>, StorageError> {
        Ok(self.state().profiles.values().cloned().collect())
    }

    fn upsert_hardware_profiles(&self, profiles: &[HardwareProfile]) -> Result<(), StorageError> {
        let mut state = self.state();
        for profile in profiles {
            state.profiles.insert(profile.id.clone(), profile.clone());
        }
        state.writes += 1;
        Ok(())
    }
}

impl RevenueStorageReader for InMemoryStorage {
    fn allocations_at(&self, height: u64) -> Result<Vec<RevenueAllocation>, StorageError> {
        Ok(self
            .state()
            .allocations
            .range((height, String::new())..)
            .take_while(|((h, _), _)| *h == height)
            .map(|(_, allocation)| allocation.clone())
            .collect())
    }

    fn allocations_in_range(
        &self,
        profile_id: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<RevenueAllocation>, StorageError> {
        Ok(self
            .state()
            .allocations
            .values()
            .filter(|allocation| {
                allocation.profile_id == profile_id && (from..=to).contains(&allocation.timestamp)
            })
            .cloned()
            .collect())
    }
}
