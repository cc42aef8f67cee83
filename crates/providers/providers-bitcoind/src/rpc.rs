//! JSON-RPC envelope and response types of Bitcoin Core.

use hashprice_pipeline::ChainSourceError;
use hashprice_primitives::{RawTransaction, Txid};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Error code returned for unknown blocks and transactions.
pub(crate) const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;
/// Error code returned for out-of-range heights.
pub(crate) const RPC_INVALID_PARAMETER: i64 = -8;

#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a> {
    pub(crate) jsonrpc: &'static str,
    pub(crate) id: u64,
    pub(crate) method: &'a str,
    pub(crate) params: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorObject {
    pub(crate) code: i64,
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub(crate) result: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Unwraps the envelope into the typed result, or the node's error object.
    pub(crate) fn into_result<T: DeserializeOwned>(self) -> Result<T, ChainSourceError> {
        if let Some(RpcErrorObject { code, message }) = self.error {
            return Err(ChainSourceError::Rpc { code, message });
        }
        serde_json::from_value(self.result.unwrap_or(Value::Null))
            .map_err(|err| ChainSourceError::Decode(err.to_string()))
    }
}

/// An output of a verbose `getrawtransaction` response.
#[derive(Debug, Deserialize)]
pub(crate) struct VerboseOutput {
    pub(crate) value: f64,
}

/// A verbose `getrawtransaction` response, reduced to what the pipeline reads.
#[derive(Debug, Deserialize)]
pub(crate) struct VerboseTransaction {
    pub(crate) txid: Txid,
    #[serde(default)]
    pub(crate) vout: Vec<VerboseOutput>,
}

impl From<VerboseTransaction> for RawTransaction {
    fn from(tx: VerboseTransaction) -> Self {
        Self { txid: tx.txid, output_values: tx.vout.into_iter().map(|out| out.value).collect() }
    }
}
