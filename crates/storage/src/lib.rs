//! Persistence for the hashprice pipeline.
//!
//! The storage layer keeps four append-mostly series keyed by block height: block metrics,
//! price quotes, and revenue allocations, plus the hardware profile reference data. A single
//! height is committed atomically through [`BlockStorageWriter::commit_height`], which also
//! enforces that committed heights stay contiguous.
//!
//! [`HashpriceDb`] is the RocksDB-backed implementation used by the binary.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod db;
pub use db::HashpriceDb;

mod error;
pub use error::StorageError;

mod models;

mod traits;
pub use traits::{
    BlockStorageReader, BlockStorageWriter, HardwareProfileStorage, HeightCommit,
    PipelineStorage, RevenueStorageReader,
};
