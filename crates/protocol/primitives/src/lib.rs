#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod subsidy;
pub use subsidy::{
    BASE_SUBSIDY_SATS, HALVING_INTERVAL, MAX_HALVINGS, SATS_PER_COIN, block_subsidy,
    block_subsidy_sats,
};

mod block;
pub use block::{BlockHash, BlockMetrics, PricedBlock, RawBlock, RawTransaction, Txid};

mod price;
pub use price::{CurrencyPair, PricePoint, PriceQuote};

mod profile;
pub use profile::{HardwareProfile, default_hardware_profiles};

mod revenue;
pub use revenue::RevenueAllocation;
