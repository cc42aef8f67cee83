//! In-memory sources and storage for testing the pipeline.

mod chain;
pub use chain::TestChainSource;

mod price;
pub use price::{PriceMode, TestPriceSource};

mod storage;
pub use storage::InMemoryStorage;
