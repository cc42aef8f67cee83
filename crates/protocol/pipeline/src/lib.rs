#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod errors;
pub use errors::{ChainSourceError, PipelineError, PipelineResult, PriceSourceError};

mod traits;
pub use traits::{ChainSource, PriceSource};

mod stream;
pub use stream::{amap, walk};

mod extractor;
pub use extractor::MetricsExtractor;

mod enricher;
pub use enricher::{DEFAULT_MIN_QUERY_DELAY, PriceEnricher, closest_point, lookup_half_window};

mod allocator;
pub use allocator::{RevenueAllocator, WATT_HOURS_PER_MWH};

mod orchestrator;
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunOutcome, RunReport, RunState};

mod metrics;
pub use metrics::Metrics;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
