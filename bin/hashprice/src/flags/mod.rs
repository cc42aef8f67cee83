//! CLI flags.

mod globals;
pub(crate) use globals::GlobalArgs;

mod chain;
pub(crate) use chain::ChainArgs;

mod price;
pub(crate) use price::PriceArgs;

mod pipeline;
pub(crate) use pipeline::PipelineArgs;

mod range;
pub(crate) use range::TimeRangeArgs;
