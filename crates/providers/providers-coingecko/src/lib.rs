//! A [`PriceSource`](hashprice_pipeline::PriceSource) backed by the CoinGecko API.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod client;
pub use client::{
    API_KEY_HEADER, CoinGeckoClient, CoinGeckoConfig, DEFAULT_API_URL, DEFAULT_CACHE_SIZE,
    DEFAULT_REQUEST_TIMEOUT,
};
