//! Price enrichment of block metrics.

use crate::{PipelineResult, PriceSource, metrics::Metrics};
use hashprice_primitives::{BlockMetrics, CurrencyPair, PricePoint, PriceQuote, PricedBlock};
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info};

/// Default pause after every price query. Keeps the pipeline at five queries per minute.
pub const DEFAULT_MIN_QUERY_DELAY: Duration = Duration::from_secs(12);

const DAY_SECS: u64 = 86_400;

/// Returns the half-width, in seconds, of the lookup window for a block `age_secs` old.
///
/// Public price series get coarser the further back they go: five-minute samples for the
/// last day, hourly samples up to ninety days, daily samples beyond that.
pub const fn lookup_half_window(age_secs: u64) -> u64 {
    if age_secs <= DAY_SECS {
        300
    } else if age_secs <= 90 * DAY_SECS {
        3_600
    } else {
        DAY_SECS
    }
}

/// Returns the point closest in time to `target_ms`. Ties go to the earliest point in `points`.
pub fn closest_point(points: &[PricePoint], target_ms: u64) -> Option<PricePoint> {
    points.iter().copied().min_by_key(|point| point.timestamp_ms.abs_diff(target_ms))
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}

/// Augments [`BlockMetrics`] with the historical price closest to the block timestamp.
///
/// Every call issues exactly one query against the price source and then waits
/// `min_query_delay` before returning, whatever the query produced. The pipeline is strictly
/// sequential through this stage, so the pause bounds the request rate seen by the source.
#[derive(Debug, Clone)]
pub struct PriceEnricher {
    /// The historical price source.
    source: Arc<dyn PriceSource>,
    /// The pair to quote.
    pair: CurrencyPair,
    /// Pause after every query.
    min_query_delay: Duration,
    /// Returns the current time in seconds since the Unix epoch.
    clock: fn() -> u64,
}

impl PriceEnricher {
    /// Creates a new [`PriceEnricher`] quoting `pair` from `source`.
    pub fn new(source: Arc<dyn PriceSource>, pair: CurrencyPair) -> Self {
        Self { source, pair, min_query_delay: DEFAULT_MIN_QUERY_DELAY, clock: unix_now }
    }

    /// Sets the pause enforced after every query.
    pub const fn with_min_query_delay(mut self, delay: Duration) -> Self {
        self.min_query_delay = delay;
        self
    }

    /// Replaces the wall clock used to age blocks.
    pub const fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// The pair being quoted.
    pub const fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    /// Looks up the price for `metrics` and returns the enriched record.
    ///
    /// An empty lookup window is not an error: the returned quote is simply empty.
    pub async fn enrich(&self, metrics: BlockMetrics) -> PipelineResult<PricedBlock> {
        let height = metrics.height;
        let target = metrics.timestamp;
        let half_window = lookup_half_window((self.clock)().saturating_sub(target));
        let from = target.saturating_sub(half_window);
        let to = target.saturating_add(half_window);

        let response = self.source.price_range(&self.pair, from, to).await;
        tokio::time::sleep(self.min_query_delay).await;
        let points = response?;

        let in_window: Vec<_> = points
            .into_iter()
            .filter(|point| (from * 1000..=to * 1000).contains(&point.timestamp_ms))
            .collect();

        let quote = match closest_point(&in_window, target * 1000) {
            Some(point) => {
                debug!(
                    target: "enricher",
                    height,
                    price = point.price,
                    offset_ms = point.timestamp_ms.abs_diff(target * 1000),
                    "Selected price point"
                );
                PriceQuote::found(height, point)
            }
            None => {
                info!(target: "enricher", height, from, to, pair = %self.pair, "No price in window");
                Metrics::record_price_miss();
                PriceQuote::missing(height)
            }
        };

        Ok(PricedBlock { metrics, quote })
    }
}
