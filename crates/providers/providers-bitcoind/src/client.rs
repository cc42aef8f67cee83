//! The Bitcoin Core chain source.

use crate::rpc::{
    RPC_INVALID_ADDRESS_OR_KEY, RPC_INVALID_PARAMETER, RpcRequest, RpcResponse, VerboseTransaction,
};
use async_trait::async_trait;
use hashprice_pipeline::{ChainSource, ChainSourceError};
use hashprice_primitives::{BlockHash, RawBlock, RawTransaction, Txid};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{debug, trace, warn};
use url::Url;

/// Number of blocks `getnetworkhashps` averages over by default.
pub const DEFAULT_HASHRATE_WINDOW: u64 = 120;

/// Default timeout of a single RPC call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`BitcoindClient`].
#[derive(Debug, Clone)]
pub struct BitcoindConfig {
    /// The node's RPC endpoint.
    pub url: Url,
    /// RPC user name.
    pub user: Option<String>,
    /// RPC password.
    pub password: Option<String>,
    /// Timeout of a single RPC call.
    pub timeout: Duration,
    /// Number of blocks the network hash rate is averaged over.
    pub hashrate_window: u64,
}

impl BitcoindConfig {
    /// Creates a config for `url` with default settings and no credentials.
    pub const fn new(url: Url) -> Self {
        Self {
            url,
            user: None,
            password: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            hashrate_window: DEFAULT_HASHRATE_WINDOW,
        }
    }

    /// Sets the RPC credentials.
    pub fn with_auth(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.user = Some(user.into());
        self.password = password;
        self
    }
}

/// A [`ChainSource`] backed by Bitcoin Core's JSON-RPC interface.
#[derive(Debug)]
pub struct BitcoindClient {
    inner: Client,
    config: BitcoindConfig,
    next_id: AtomicU64,
}

impl BitcoindClient {
    /// Creates a new [`BitcoindClient`].
    pub fn new(config: BitcoindConfig) -> Result<Self, ChainSourceError> {
        let inner = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ChainSourceError::Transport(err.to_string()))?;
        Ok(Self { inner, config, next_id: AtomicU64::new(0) })
    }

    /// The node's RPC endpoint.
    pub const fn url(&self) -> &Url {
        &self.config.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainSourceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest { jsonrpc: "1.0", id, method, params };
        trace!(target: "bitcoind", method, id, "Sending request");

        let mut builder = self.inner.post(self.config.url.clone()).json(&request);
        if let Some(user) = &self.config.user {
            builder = builder.basic_auth(user, self.config.password.as_ref());
        }
        let response = builder.send().await.map_err(|err| {
            warn!(target: "bitcoind", method, %err, "Request failed");
            ChainSourceError::Transport(err.to_string())
        })?;

        // Bitcoin Core reports RPC errors with a non-success status and a JSON body.
        let status = response.status();
        let body = response.bytes().await.map_err(|err| ChainSourceError::Transport(err.to_string()))?;
        match serde_json::from_slice::<RpcResponse>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => {
                Err(ChainSourceError::Transport(format!("unexpected status {status}")))
            }
            Err(err) => Err(ChainSourceError::Decode(err.to_string())),
        }
    }
}

#[async_trait]
impl ChainSource for BitcoindClient {
    async fn tip_height(&self) -> Result<u64, ChainSourceError> {
        self.call("getblockcount", json!([])).await
    }

    async fn block_hash(&self, height: u64) -> Result<BlockHash, ChainSourceError> {
        self.call("getblockhash", json!([height])).await.map_err(|err| match err {
            ChainSourceError::Rpc { code: RPC_INVALID_PARAMETER, .. } => {
                ChainSourceError::BlockNotFound(format!("height {height}"))
            }
            other => other,
        })
    }

    async fn block(&self, hash: &BlockHash) -> Result<RawBlock, ChainSourceError> {
        let block: RawBlock =
            self.call("getblock", json!([hash, 1])).await.map_err(|err| match err {
                ChainSourceError::Rpc { code: RPC_INVALID_ADDRESS_OR_KEY, .. } => {
                    ChainSourceError::BlockNotFound(hash.clone())
                }
                other => other,
            })?;
        debug!(target: "bitcoind", height = block.height, txs = block.txids.len(), "Fetched block");
        Ok(block)
    }

    async fn transaction(
        &self,
        txid: &Txid,
        block_hash: &BlockHash,
    ) -> Result<RawTransaction, ChainSourceError> {
        let tx: VerboseTransaction =
            self.call("getrawtransaction", json!([txid, true, block_hash])).await?;
        Ok(tx.into())
    }

    async fn network_hash_rate(&self, height: u64) -> Result<f64, ChainSourceError> {
        self.call("getnetworkhashps", json!([self.config.hashrate_window, height])).await
    }
}
