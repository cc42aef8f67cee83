//! Chain source flags.

use hashprice_providers_bitcoind::{BitcoindClient, BitcoindConfig, DEFAULT_HASHRATE_WINDOW};
use std::time::Duration;
use url::Url;

const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Bitcoin Core RPC arguments.
#[derive(Clone, Debug, clap::Args)]
pub(crate) struct ChainArgs {
    /// URL of the node's JSON-RPC interface.
    #[arg(long = "chain.rpc-url", env = "HASHPRICE_RPC_URL", default_value = "http://127.0.0.1:8332")]
    pub(crate) rpc_url: Url,
    /// RPC user name.
    #[arg(long = "chain.rpc-user", env = "HASHPRICE_RPC_USER")]
    pub(crate) rpc_user: Option<String>,
    /// RPC password.
    #[arg(long = "chain.rpc-pass", env = "HASHPRICE_RPC_PASS", hide_env_values = true)]
    pub(crate) rpc_pass: Option<String>,
    /// Number of blocks the network hash rate is averaged over.
    #[arg(long = "chain.hashrate-window", env = "HASHPRICE_HASHRATE_WINDOW", default_value_t = DEFAULT_HASHRATE_WINDOW)]
    pub(crate) hashrate_window: u64,
    /// Timeout of a single RPC call, in seconds.
    #[arg(long = "chain.timeout-secs", env = "HASHPRICE_RPC_TIMEOUT", default_value_t = DEFAULT_RPC_TIMEOUT_SECS)]
    pub(crate) timeout_secs: u64,
}

impl ChainArgs {
    /// Builds the chain source client.
    pub(crate) fn client(&self) -> anyhow::Result<BitcoindClient> {
        let mut config = BitcoindConfig::new(self.rpc_url.clone());
        if let Some(user) = &self.rpc_user {
            config = config.with_auth(user.clone(), self.rpc_pass.clone());
        }
        config.hashrate_window = self.hashrate_window;
        config.timeout = Duration::from_secs(self.timeout_secs);
        Ok(BitcoindClient::new(config)?)
    }
}
