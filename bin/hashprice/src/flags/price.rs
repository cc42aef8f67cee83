//! Price source flags.

use hashprice_pipeline::DEFAULT_MIN_QUERY_DELAY;
use hashprice_primitives::CurrencyPair;
use hashprice_providers_coingecko::{CoinGeckoClient, CoinGeckoConfig, DEFAULT_API_URL};
use std::time::Duration;
use url::Url;

/// Historical price source arguments.
#[derive(Clone, Debug, clap::Args)]
pub(crate) struct PriceArgs {
    /// Base URL of the price API.
    #[arg(long = "price.api-url", env = "HASHPRICE_PRICE_API_URL", default_value = DEFAULT_API_URL)]
    pub(crate) api_url: Url,
    /// Optional API key sent with every request.
    #[arg(long = "price.api-key", env = "HASHPRICE_PRICE_API_KEY", hide_env_values = true)]
    pub(crate) api_key: Option<String>,
    /// Minimum delay after every price query, in seconds.
    #[arg(long = "price.min-delay-secs", env = "HASHPRICE_PRICE_MIN_DELAY", default_value_t = DEFAULT_MIN_QUERY_DELAY.as_secs())]
    pub(crate) min_delay_secs: u64,
    /// The reference currency.
    #[arg(long = "price.vs-currency", env = "HASHPRICE_VS_CURRENCY", default_value = "usd")]
    pub(crate) vs_currency: String,
    /// The price API's identifier of the mined coin.
    #[arg(long = "price.coin-id", env = "HASHPRICE_COIN_ID", default_value = "bitcoin")]
    pub(crate) coin_id: String,
}

impl PriceArgs {
    /// The pair to quote.
    pub(crate) fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.coin_id, &self.vs_currency)
    }

    /// The pause enforced after every query.
    pub(crate) const fn min_query_delay(&self) -> Duration {
        Duration::from_secs(self.min_delay_secs)
    }

    /// Builds the price source client.
    pub(crate) fn client(&self) -> anyhow::Result<CoinGeckoClient> {
        let mut config = CoinGeckoConfig::new(self.api_url.clone());
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        Ok(CoinGeckoClient::new(config)?)
    }
}
