//! Main database access structure.

use crate::{
    BlockStorageReader, BlockStorageWriter, HardwareProfileStorage, HeightCommit,
    RevenueStorageReader, StorageError,
    models::{
        BLOCK_METRICS, COLUMN_FAMILIES, HARDWARE_PROFILES, PRICE_QUOTES, REVENUE_ALLOCATIONS,
        allocation_key, decode_height, height_key,
    },
};
use hashprice_primitives::{
    BlockMetrics, HardwareProfile, PriceQuote, PricedBlock, RevenueAllocation,
};
use rocksdb::{ColumnFamily, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::de::DeserializeOwned;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, error, warn};

/// RocksDB-backed store for every hashprice series.
///
/// Writes go through a single in-process lock so that the "latest height" check and the
/// batch write of [`BlockStorageWriter::commit_height`] cannot interleave with another
/// commit. RocksDB's own file lock keeps a second process from opening the same path.
pub struct HashpriceDb {
    db: DB,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl fmt::Debug for HashpriceDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashpriceDb").field("path", &self.path).finish_non_exhaustive()
    }
}

impl HashpriceDb {
    /// Creates or opens a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, path, COLUMN_FAMILIES).inspect_err(|err| {
            error!(target: "storage", path = %path.display(), %err, "Failed to open database");
        })?;
        debug!(target: "storage", path = %path.display(), "Opened database");

        Ok(Self { db, path: path.to_path_buf(), write_lock: Mutex::new(()) })
    }

    /// The path the database was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::Database(format!("missing column family {name}")))
    }

    fn get<T: DeserializeOwned>(
        &self,
        cf: &'static str,
        key: &[u8],
    ) -> Result<Option<T>, StorageError> {
        let Some(bytes) = self.db.get_cf(self.cf(cf)?, key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Iterates `cf` forward from `start`, handing each decoded entry to `visit` until it
    /// returns `false`.
    fn scan_from<T, F>(&self, cf: &'static str, start: &[u8], mut visit: F) -> Result<(), StorageError>
    where
        T: DeserializeOwned,
        F: FnMut(&[u8], T) -> bool,
    {
        let iter = self.db.iterator_cf(self.cf(cf)?, IteratorMode::From(start, Direction::Forward));
        for entry in iter {
            let (key, value) = entry?;
            let value = serde_json::from_slice(&value)?;
            if !visit(&key, value) {
                break;
            }
        }
        Ok(())
    }
}

impl BlockStorageReader for HashpriceDb {
    fn latest_height(&self) -> Result<Option<u64>, StorageError> {
        let mut iter = self.db.iterator_cf(self.cf(BLOCK_METRICS)?, IteratorMode::End);
        match iter.next() {
            Some(entry) => {
                let (key, _) = entry?;
                decode_height(&key).map(Some).ok_or_else(|| {
                    StorageError::Database(format!("malformed height key of length {}", key.len()))
                })
            }
            None => Ok(None),
        }
    }

    fn block_metrics(&self, height: u64) -> Result<BlockMetrics, StorageError> {
        self.get(BLOCK_METRICS, &height_key(height))?.ok_or_else(|| {
            warn!(target: "storage", height, "Block metrics not found");
            StorageError::EntryNotFound(format!("block metrics at height {height}"))
        })
    }

    fn price_quote(&self, height: u64) -> Result<PriceQuote, StorageError> {
        self.get(PRICE_QUOTES, &height_key(height))?.ok_or_else(|| {
            warn!(target: "storage", height, "Price quote not found");
            StorageError::EntryNotFound(format!("price quote at height {height}"))
        })
    }

    fn priced_blocks_in_range(&self, from: u64, to: u64) -> Result<Vec<PricedBlock>, StorageError> {
        let mut metrics_in_range = Vec::new();
        self.scan_from(BLOCK_METRICS, &[], |_, metrics: BlockMetrics| {
            if (from..=to).contains(&metrics.timestamp) {
                metrics_in_range.push(metrics);
            }
            true
        })?;

        metrics_in_range
            .into_iter()
            .map(|metrics| {
                let quote = self.price_quote(metrics.height)?;
                Ok(PricedBlock { metrics, quote })
            })
            .collect()
    }
}

impl BlockStorageWriter for HashpriceDb {
    fn commit_height(&self, commit: HeightCommit) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Database("write lock poisoned".to_string()))?;

        let height = commit.height();
        if let Some(latest) = self.latest_height()? &&
            latest.checked_add(1) != Some(height)
        {
            warn!(target: "storage", latest, height, "Rejected non-contiguous commit");
            return Err(StorageError::ConflictError(format!(
                "height {height} does not follow latest committed height {latest}"
            )));
        }
        if commit.block.quote.height != height ||
            commit.allocations.iter().any(|allocation| allocation.height != height)
        {
            return Err(StorageError::ConflictError(format!(
                "commit for height {height} contains rows for another height"
            )));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(BLOCK_METRICS)?,
            height_key(height),
            serde_json::to_vec(&commit.block.metrics)?,
        );
        batch.put_cf(
            self.cf(PRICE_QUOTES)?,
            height_key(height),
            serde_json::to_vec(&commit.block.quote)?,
        );
        let allocations_cf = self.cf(REVENUE_ALLOCATIONS)?;
        for allocation in &commit.allocations {
            batch.put_cf(
                allocations_cf,
                allocation_key(height, &allocation.profile_id),
                serde_json::to_vec(allocation)?,
            );
        }

        self.db.write(batch).inspect_err(|err| {
            error!(target: "storage", height, %err, "Failed to commit height");
        })?;
        debug!(target: "storage", height, allocations = commit.allocations.len(), "Committed height");
        Ok(())
    }
}

impl HardwareProfileStorage for HashpriceDb {
    fn hardware_profiles(&self) -> Result<Vec<HardwareProfile>, StorageError> {
        let mut profiles = Vec::new();
        self.scan_from(HARDWARE_PROFILES, &[], |_, profile: HardwareProfile| {
            profiles.push(profile);
            true
        })?;
        Ok(profiles)
    }

    fn upsert_hardware_profiles(&self, profiles: &[HardwareProfile]) -> Result<(), StorageError> {
        let cf = self.cf(HARDWARE_PROFILES)?;
        let mut batch = WriteBatch::default();
        for profile in profiles {
            batch.put_cf(cf, profile.id.as_bytes(), serde_json::to_vec(profile)?);
        }
        self.db.write(batch)?;
        Ok(())
    }
}

impl RevenueStorageReader for HashpriceDb {
    fn allocations_at(&self, height: u64) -> Result<Vec<RevenueAllocation>, StorageError> {
        let prefix = height_key(height);
        let mut allocations = Vec::new();
        self.scan_from(REVENUE_ALLOCATIONS, &prefix, |key, allocation: RevenueAllocation| {
            if !key.starts_with(&prefix) {
                return false;
            }
            allocations.push(allocation);
            true
        })?;
        Ok(allocations)
    }

    fn allocations_in_range(
        &self,
        profile_id: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<RevenueAllocation>, StorageError> {
        let mut allocations = Vec::new();
        self.scan_from(REVENUE_ALLOCATIONS, &[], |_, allocation: RevenueAllocation| {
            if allocation.profile_id == profile_id && (from..=to).contains(&allocation.timestamp) {
                allocations.push(allocation);
            }
            true
        })?;
        Ok(allocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashprice_primitives::{PricePoint, default_hardware_profiles};
    use tempfile::TempDir;

    fn open_db() -> (TempDir, HashpriceDb) {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let db = HashpriceDb::open(&tmp_dir.path().join("hashprice")).expect("open db");
        (tmp_dir, db)
    }

    fn commit_at(height: u64, price: Option<f64>, profiles: &[&str]) -> HeightCommit {
        let metrics = BlockMetrics {
            height,
            timestamp: 1_700_000_000 + height * 600,
            subsidy: 3.125,
            fees: 0.2,
            network_hash_rate: 6.0e20,
            time_delta_secs: 600.0,
        };
        let quote = match price {
            Some(price) => PriceQuote::found(
                height,
                PricePoint { timestamp_ms: metrics.timestamp * 1000, price },
            ),
            None => PriceQuote::missing(height),
        };
        let allocations = profiles
            .iter()
            .map(|id| RevenueAllocation {
                height,
                profile_id: (*id).to_string(),
                native_revenue: 0.01,
                reference_revenue: price.map(|p| p * 0.01),
                timestamp: metrics.timestamp,
            })
            .collect();
        HeightCommit { block: PricedBlock { metrics, quote }, allocations }
    }

    #[test]
    fn test_create_and_open_db() {
        let (_dir, db) = open_db();
        assert_eq!(db.latest_height().unwrap(), None);
        assert!(db.hardware_profiles().unwrap().is_empty());
    }

    #[test]
    fn test_commit_and_read_back() {
        let (_dir, db) = open_db();
        let commit = commit_at(840_000, Some(64_000.0), &["s21_pro", "s19j_xp"]);
        db.commit_height(commit.clone()).unwrap();

        assert_eq!(db.latest_height().unwrap(), Some(840_000));
        assert_eq!(db.block_metrics(840_000).unwrap(), commit.block.metrics);
        assert_eq!(db.price_quote(840_000).unwrap(), commit.block.quote);

        let allocations = db.allocations_at(840_000).unwrap();
        let ids: Vec<_> = allocations.iter().map(|a| a.profile_id.as_str()).collect();
        assert_eq!(ids, ["s19j_xp", "s21_pro"]);
    }

    #[test]
    fn test_missing_quote_is_persisted_as_absence() {
        let (_dir, db) = open_db();
        db.commit_height(commit_at(7, None, &["s21_pro"])).unwrap();

        let quote = db.price_quote(7).unwrap();
        assert!(!quote.is_found());
        assert_eq!(quote.quote_timestamp_ms, None);
        assert_eq!(db.allocations_at(7).unwrap()[0].reference_revenue, None);
    }

    #[test]
    fn test_rejects_gaps_and_duplicates() {
        let (_dir, db) = open_db();
        db.commit_height(commit_at(100, Some(1.0), &[])).unwrap();

        let gap = db.commit_height(commit_at(102, Some(1.0), &[]));
        assert!(matches!(gap, Err(StorageError::ConflictError(_))));
        let duplicate = db.commit_height(commit_at(100, Some(1.0), &[]));
        assert!(matches!(duplicate, Err(StorageError::ConflictError(_))));

        db.commit_height(commit_at(101, Some(1.0), &[])).unwrap();
        assert_eq!(db.latest_height().unwrap(), Some(101));
    }

    #[test]
    fn test_rejects_rows_for_other_heights() {
        let (_dir, db) = open_db();
        let mut commit = commit_at(5, Some(1.0), &["s21_pro"]);
        commit.allocations[0].height = 6;

        assert!(matches!(db.commit_height(commit), Err(StorageError::ConflictError(_))));
        assert_eq!(db.latest_height().unwrap(), None);
        assert!(db.allocations_at(6).unwrap().is_empty());
    }

    #[test]
    fn test_missing_entries() {
        let (_dir, db) = open_db();
        assert!(matches!(db.block_metrics(1), Err(StorageError::EntryNotFound(_))));
        assert!(matches!(db.price_quote(1), Err(StorageError::EntryNotFound(_))));
    }

    #[test]
    fn test_range_queries() {
        let (_dir, db) = open_db();
        for height in 10..15 {
            db.commit_height(commit_at(height, Some(2.0), &["a", "b"])).unwrap();
        }
        let from = 1_700_000_000 + 11 * 600;
        let to = 1_700_000_000 + 13 * 600;

        let blocks = db.priced_blocks_in_range(from, to).unwrap();
        let heights: Vec<_> = blocks.iter().map(PricedBlock::height).collect();
        assert_eq!(heights, [11, 12, 13]);

        let allocations = db.allocations_in_range("b", from, to).unwrap();
        assert_eq!(allocations.len(), 3);
        assert!(allocations.iter().all(|a| a.profile_id == "b"));
        assert!(db.allocations_in_range("unknown", from, to).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_profiles() {
        let (_dir, db) = open_db();
        let mut profiles = default_hardware_profiles();
        db.upsert_hardware_profiles(&profiles).unwrap();
        assert_eq!(db.hardware_profiles().unwrap().len(), 3);

        profiles[0].power_watts = 6000.0;
        db.upsert_hardware_profiles(&profiles[..1]).unwrap();
        let stored = db.hardware_profiles().unwrap();
        assert_eq!(stored.len(), 3);
        let updated = stored.iter().find(|p| p.id == profiles[0].id).unwrap();
        assert_eq!(updated.power_watts, 6000.0);
    }

    #[test]
    fn test_reopen_keeps_state() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("hashprice");
        {
            let db = HashpriceDb::open(&path).unwrap();
            db.commit_height(commit_at(1, None, &[])).unwrap();
        }
        let db = HashpriceDb::open(&path).unwrap();
        assert_eq!(db.latest_height().unwrap(), Some(1));
    }
}
