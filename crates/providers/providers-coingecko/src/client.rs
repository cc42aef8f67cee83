//! The CoinGecko price source.

use async_trait::async_trait;
use hashprice_pipeline::{PriceSource, PriceSourceError};
use hashprice_primitives::{CurrencyPair, PricePoint};
use lru::LruCache;
use reqwest::Client;
use serde::Deserialize;
use std::{
    num::NonZeroUsize,
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tracing::{debug, warn};
use url::Url;

/// The public CoinGecko API.
pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Header carrying a demo-plan API key.
pub const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Default number of range responses kept in the cache.
pub const DEFAULT_CACHE_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(255);

/// Default timeout of a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`CoinGeckoClient`].
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// Base URL of the API, without a trailing `/coins`.
    pub api_url: Url,
    /// Optional API key.
    pub api_key: Option<String>,
    /// Timeout of a single request.
    pub timeout: Duration,
    /// Number of range responses kept in the cache.
    pub cache_size: NonZeroUsize,
}

impl CoinGeckoConfig {
    /// Creates a config for `api_url` with default settings and no API key.
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct MarketChartRange {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

type RangeKey = (CurrencyPair, u64, u64);

/// A [`PriceSource`] backed by CoinGecko's `market_chart/range` endpoint.
///
/// Responses are cached by `(pair, from, to)`. A cache hit still counts as a query for the
/// purpose of rate limiting, which is enforced by the caller.
#[derive(Debug)]
pub struct CoinGeckoClient {
    inner: Client,
    config: CoinGeckoConfig,
    cache: Mutex<LruCache<RangeKey, Vec<PricePoint>>>,
}

impl CoinGeckoClient {
    /// Creates a new [`CoinGeckoClient`].
    pub fn new(config: CoinGeckoConfig) -> Result<Self, PriceSourceError> {
        let inner = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| PriceSourceError::Transport(err.to_string()))?;
        let cache = Mutex::new(LruCache::new(config.cache_size));
        Ok(Self { inner, config, cache })
    }

    fn range_url(&self, pair: &CurrencyPair) -> String {
        format!(
            "{}/coins/{}/market_chart/range",
            self.config.api_url.as_str().trim_end_matches('/'),
            pair.base
        )
    }

    fn cached(&self, key: &RangeKey) -> Option<Vec<PricePoint>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    async fn fetch(
        &self,
        pair: &CurrencyPair,
        from: u64,
        to: u64,
    ) -> Result<Vec<PricePoint>, PriceSourceError> {
        let mut request = self.inner.get(self.range_url(pair)).query(&[
            ("vs_currency", pair.quote.clone()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ]);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|err| {
            warn!(target: "coingecko", %pair, from, to, %err, "Request failed");
            PriceSourceError::Transport(err.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!(target: "coingecko", %pair, from, to, %status, "Unexpected status");
            return Err(PriceSourceError::Status(status.as_u16()));
        }

        let body: MarketChartRange =
            response.json().await.map_err(|err| PriceSourceError::Decode(err.to_string()))?;
        Ok(body
            .prices
            .into_iter()
            .filter(|(timestamp_ms, _)| *timestamp_ms >= 0.0)
            .map(|(timestamp_ms, price)| PricePoint { timestamp_ms: timestamp_ms as u64, price })
            .collect())
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn price_range(
        &self,
        pair: &CurrencyPair,
        from: u64,
        to: u64,
    ) -> Result<Vec<PricePoint>, PriceSourceError> {
        let key = (pair.clone(), from, to);
        if let Some(points) = self.cached(&key) {
            debug!(target: "coingecko", %pair, from, to, "Serving range from cache");
            return Ok(points);
        }

        let points = self.fetch(pair, from, to).await?;
        debug!(target: "coingecko", %pair, from, to, points = points.len(), "Fetched price range");
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).put(key, points.clone());
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    fn client(server: &MockServer, api_key: Option<&str>) -> CoinGeckoClient {
        let mut config = CoinGeckoConfig::new(Url::parse(&server.url("/api/v3/")).unwrap());
        if let Some(key) = api_key {
            config = config.with_api_key(key);
        }
        CoinGeckoClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_price_range() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v3/coins/bitcoin/market_chart/range")
                    .query_param("vs_currency", "usd")
                    .query_param("from", "1700000000")
                    .query_param("to", "1700000600")
                    .header(API_KEY_HEADER, "demo-key");
                then.status(200).json_body(json!({
                    "prices": [[1700000100000u64, 36500.5], [1700000400000u64, 36510.0]],
                    "market_caps": [],
                    "total_volumes": []
                }));
            })
            .await;

        let points = client(&server, Some("demo-key"))
            .price_range(&CurrencyPair::default(), 1_700_000_000, 1_700_000_600)
            .await
            .unwrap();

        assert_eq!(
            points,
            vec![
                PricePoint { timestamp_ms: 1_700_000_100_000, price: 36_500.5 },
                PricePoint { timestamp_ms: 1_700_000_400_000, price: 36_510.0 },
            ]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_repeated_range_is_served_from_cache() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({"prices": [[1000, 1.0]]}));
            })
            .await;
        let client = client(&server, None);
        let pair = CurrencyPair::default();

        let first = client.price_range(&pair, 1, 2).await.unwrap();
        let second = client.price_range(&pair, 1, 2).await.unwrap();
        client.price_range(&pair, 1, 3).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.hits_async().await, 2);
    }

    #[tokio::test]
    async fn test_missing_prices_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({}));
            })
            .await;

        let points =
            client(&server, None).price_range(&CurrencyPair::default(), 1, 2).await.unwrap();
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_is_status_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(429).body("Throttled");
            })
            .await;

        let client = client(&server, None);
        let err = client.price_range(&CurrencyPair::default(), 1, 2).await.unwrap_err();
        assert!(matches!(err, PriceSourceError::Status(429)));
        assert!(client.cached(&(CurrencyPair::default(), 1, 2)).is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body("<html></html>");
            })
            .await;

        let err =
            client(&server, None).price_range(&CurrencyPair::default(), 1, 2).await.unwrap_err();
        assert!(matches!(err, PriceSourceError::Decode(_)));
    }
}
