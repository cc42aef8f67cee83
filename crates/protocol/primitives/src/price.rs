//! Price series types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency pair understood by the price source.
///
/// `base` is the source's identifier of the mined coin, `quote` the reference currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Identifier of the priced asset, e.g. `bitcoin`.
    pub base: String,
    /// The reference currency, e.g. `usd`.
    pub quote: String,
}

impl CurrencyPair {
    /// Creates a new [`CurrencyPair`].
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self { base: base.into(), quote: quote.into() }
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self::new("bitcoin", "usd")
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// A single sample of the historical price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Sample time in milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Price in the reference currency.
    pub price: f64,
}

/// The price recorded for one block height.
///
/// `price` and `quote_timestamp_ms` are either both present or both absent. Absence means the
/// source returned no sample inside the lookup window, and is persisted as such.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Height of the block this quote belongs to.
    pub height: u64,
    /// Price in the reference currency.
    pub price: Option<f64>,
    /// Time of the sample that was used, in milliseconds since the Unix epoch.
    pub quote_timestamp_ms: Option<u64>,
}

impl PriceQuote {
    /// A quote built from the selected [`PricePoint`].
    pub const fn found(height: u64, point: PricePoint) -> Self {
        Self { height, price: Some(point.price), quote_timestamp_ms: Some(point.timestamp_ms) }
    }

    /// A quote recording that no sample was available.
    pub const fn missing(height: u64) -> Self {
        Self { height, price: None, quote_timestamp_ms: None }
    }

    /// Whether a sample was found for the block.
    pub const fn is_found(&self) -> bool {
        self.price.is_some()
    }
}
