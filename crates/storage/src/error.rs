use thiserror::Error;

/// Errors that may occur while interacting with hashprice storage.
///
/// This enum is used across all implementations of the storage traits.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying database failed.
    #[error("database error: {0}")]
    Database(String),

    /// A stored value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The expected entry was not found in the database.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// Represents a conflict occurred while attempting to write to the database.
    #[error("conflict error: {0}")]
    ConflictError(String),
}

impl From<rocksdb::Error> for StorageError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Database(err.into_string())
    }
}
