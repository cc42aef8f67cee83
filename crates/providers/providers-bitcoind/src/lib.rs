//! A [`ChainSource`](hashprice_pipeline::ChainSource) backed by a Bitcoin Core node.
//!
//! The client speaks the node's JSON-RPC 1.0 dialect over HTTP with basic authentication.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod client;
pub use client::{BitcoindClient, BitcoindConfig, DEFAULT_HASHRATE_WINDOW, DEFAULT_REQUEST_TIMEOUT};

mod rpc;
