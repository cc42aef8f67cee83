//! Metrics for the hashprice pipeline.

use std::time::Duration;

/// Container for the pipeline's metric names and recording helpers.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Counter of committed heights.
    pub const BLOCKS_COMMITTED_TOTAL: &'static str = "hashprice_blocks_committed_total";
    /// Counter of heights committed without a price.
    pub const PRICE_MISSES_TOTAL: &'static str = "hashprice_price_misses_total";
    /// Counter of revenue allocation rows written.
    pub const ALLOCATIONS_WRITTEN_TOTAL: &'static str = "hashprice_allocations_written_total";
    /// Counter of finished runs, labelled by outcome.
    pub const RUNS_TOTAL: &'static str = "hashprice_runs_total";
    /// Histogram of run durations.
    pub const RUN_DURATION_SECONDS: &'static str = "hashprice_run_duration_seconds";
    /// Gauge of the latest committed height.
    pub const LAST_COMMITTED_HEIGHT: &'static str = "hashprice_last_committed_height";

    /// Run outcome label values.
    const OUTCOMES: [&'static str; 4] = ["completed", "up_to_date", "skipped", "failed"];

    /// Describes and zeroes every pipeline metric.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::BLOCKS_COMMITTED_TOTAL,
            metrics::Unit::Count,
            "Total number of block heights committed",
        );
        metrics::describe_counter!(
            Self::PRICE_MISSES_TOTAL,
            metrics::Unit::Count,
            "Total number of blocks for which no price was found in the lookup window",
        );
        metrics::describe_counter!(
            Self::ALLOCATIONS_WRITTEN_TOTAL,
            metrics::Unit::Count,
            "Total number of revenue allocation rows written",
        );
        metrics::describe_counter!(
            Self::RUNS_TOTAL,
            metrics::Unit::Count,
            "Total number of pipeline runs by outcome",
        );
        metrics::describe_histogram!(
            Self::RUN_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "Duration of pipeline runs",
        );
        metrics::describe_gauge!(
            Self::LAST_COMMITTED_HEIGHT,
            metrics::Unit::Count,
            "Highest committed block height",
        );
    }

    fn zero() {
        metrics::counter!(Self::BLOCKS_COMMITTED_TOTAL).increment(0);
        metrics::counter!(Self::PRICE_MISSES_TOTAL).increment(0);
        metrics::counter!(Self::ALLOCATIONS_WRITTEN_TOTAL).increment(0);
        for outcome in Self::OUTCOMES {
            metrics::counter!(Self::RUNS_TOTAL, "outcome" => outcome).increment(0);
        }
    }

    pub(crate) fn record_price_miss() {
        metrics::counter!(Self::PRICE_MISSES_TOTAL).increment(1);
    }

    pub(crate) fn record_commit(height: u64, allocations: usize) {
        metrics::counter!(Self::BLOCKS_COMMITTED_TOTAL).increment(1);
        metrics::counter!(Self::ALLOCATIONS_WRITTEN_TOTAL).increment(allocations as u64);
        metrics::gauge!(Self::LAST_COMMITTED_HEIGHT).set(height as f64);
    }

    pub(crate) fn record_run(outcome: &'static str, elapsed: Duration) {
        metrics::counter!(Self::RUNS_TOTAL, "outcome" => outcome).increment(1);
        metrics::histogram!(Self::RUN_DURATION_SECONDS).record(elapsed.as_secs_f64());
    }
}
