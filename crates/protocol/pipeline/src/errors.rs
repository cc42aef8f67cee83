//! Error types for the hashprice pipeline.

use hashprice_storage::StorageError;
use thiserror::Error;

/// A result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// An error returned by a [`crate::ChainSource`].
#[derive(Error, Debug)]
pub enum ChainSourceError {
    /// The source could not be reached or timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The source answered with an error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// The error code reported by the source.
        code: i64,
        /// The error message reported by the source.
        message: String,
    },

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The requested block is unknown to the source.
    #[error("block not found: {0}")]
    BlockNotFound(String),
}

/// An error returned by a [`crate::PriceSource`].
#[derive(Error, Debug)]
pub enum PriceSourceError {
    /// The source could not be reached or timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The source answered with a non-success status.
    #[error("unexpected status code {0}")]
    Status(u16),

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// An error that aborts a pipeline run.
///
/// Every variant stops the run at the height being processed. Heights committed before the
/// failure stay valid and the next run resumes after them.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The chain source failed.
    #[error("chain source: {0}")]
    Chain(#[from] ChainSourceError),

    /// The price source failed.
    #[error("price source: {0}")]
    Price(#[from] PriceSourceError),

    /// The storage layer failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Nothing was committed yet and no start height is configured.
    #[error("no start height configured and no committed height to resume from")]
    MissingStartHeight,
}

impl PipelineError {
    /// Whether the next scheduled run may succeed without operator action.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Chain(_) | Self::Price(_) => true,
            Self::Storage(StorageError::ConflictError(_)) | Self::MissingStartHeight => false,
            Self::Storage(_) => true,
        }
    }
}
