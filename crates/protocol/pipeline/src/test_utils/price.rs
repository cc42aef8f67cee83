//! A scripted price source for testing.

use crate::{PriceSource, PriceSourceError};
use async_trait::async_trait;
use hashprice_primitives::{CurrencyPair, PricePoint};
use std::sync::{Mutex, MutexGuard};

/// How a [`TestPriceSource`] answers queries.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceMode {
    /// Returns the same points for every query.
    Fixed(Vec<PricePoint>),
    /// Returns one point at the middle of the queried range.
    Centered(f64),
    /// Returns no points.
    Empty,
    /// Fails every query with a `429` status.
    Failing,
}

/// A [`PriceSource`] that answers from a [`PriceMode`] and records every query.
#[derive(Debug)]
pub struct TestPriceSource {
    mode: Mutex<PriceMode>,
    queries: Mutex<Vec<(u64, u64)>>,
}

impl TestPriceSource {
    /// Creates a source answering in `mode`.
    pub const fn new(mode: PriceMode) -> Self {
        Self { mode: Mutex::new(mode), queries: Mutex::new(Vec::new()) }
    }

    /// A source returning `points` for every query.
    pub const fn fixed(points: Vec<PricePoint>) -> Self {
        Self::new(PriceMode::Fixed(points))
    }

    /// A source quoting `price` at the middle of every queried range.
    pub const fn centered(price: f64) -> Self {
        Self::new(PriceMode::Centered(price))
    }

    /// A source with no data.
    pub const fn empty() -> Self {
        Self::new(PriceMode::Empty)
    }

    /// A source failing every query.
    pub const fn failing() -> Self {
        Self::new(PriceMode::Failing)
    }

    /// Changes how subsequent queries are answered.
    pub fn set_mode(&self, mode: PriceMode) {
        *lock(&self.mode) = mode;
    }

    /// Every `(from, to)` range queried so far.
    pub fn queries(&self) -> Vec<(u64, u64)> {
        lock(&self.queries).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PriceSource for TestPriceSource {
    async fn price_range(
        &self,
        _pair: &CurrencyPair,
        from: u64,
        to: u64,
    ) -> Result<Vec<PricePoint>, PriceSourceError> {
        lock(&self.queries).push((from, to));
        match &*lock(&self.mode) {
            PriceMode::Fixed(points) => Ok(points.clone()),
            PriceMode::Centered(price) => {
                let timestamp_ms = (from + (to - from) / 2) * 1000;
                Ok(vec![PricePoint { timestamp_ms, price: *price }])
            }
            PriceMode::Empty => Ok(Vec::new()),
            PriceMode::Failing => Err(PriceSourceError::Status(429)),
        }
    }
}
