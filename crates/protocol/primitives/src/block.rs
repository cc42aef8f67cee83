//! Block records produced by the chain source and by the pipeline stages.

use crate::PriceQuote;
use serde::{Deserialize, Serialize};

/// A hex-encoded block hash, as reported by the chain source.
pub type BlockHash = String;

/// A hex-encoded transaction id, as reported by the chain source.
pub type Txid = String;

/// A block as returned by the chain source.
///
/// This is ephemeral: only the [`BlockMetrics`] derived from it are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    /// The block height.
    pub height: u64,
    /// The block hash.
    pub hash: BlockHash,
    /// The block timestamp, in seconds since the Unix epoch.
    pub time: u64,
    /// Transaction ids in block order. The first one is the coinbase.
    #[serde(rename = "tx")]
    pub txids: Vec<Txid>,
    /// The hash of the successor block, absent at the chain tip.
    #[serde(rename = "nextblockhash", default, skip_serializing_if = "Option::is_none")]
    pub next_hash: Option<BlockHash>,
}

impl RawBlock {
    /// Returns the coinbase transaction id, if the block lists any transaction.
    pub fn coinbase_txid(&self) -> Option<&Txid> {
        self.txids.first()
    }
}

/// A transaction as returned by the chain source, reduced to its output values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// The transaction id.
    pub txid: Txid,
    /// Output values in native units.
    pub output_values: Vec<f64>,
}

impl RawTransaction {
    /// Sums every output value of the transaction.
    pub fn total_output(&self) -> f64 {
        self.output_values.iter().sum()
    }
}

/// Normalized per-block mining economics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMetrics {
    /// The block height. Unique and strictly increasing across persisted rows.
    pub height: u64,
    /// The block timestamp, in seconds since the Unix epoch.
    pub timestamp: u64,
    /// The block subsidy, in native units.
    pub subsidy: f64,
    /// Coinbase outputs minus the subsidy, in native units. May be negative.
    pub fees: f64,
    /// The network hash rate reported by the chain source at this height, in H/s.
    pub network_hash_rate: f64,
    /// Seconds elapsed since the previous block. May be negative.
    pub time_delta_secs: f64,
}

impl BlockMetrics {
    /// Total miner revenue for the block: subsidy plus fees.
    pub fn block_revenue(&self) -> f64 {
        self.subsidy + self.fees
    }
}

/// A [`BlockMetrics`] record enriched with the price quote used for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedBlock {
    /// The metrics extracted from the block.
    pub metrics: BlockMetrics,
    /// The quote selected for the block timestamp, possibly empty.
    pub quote: PriceQuote,
}

impl PricedBlock {
    /// The block height.
    pub const fn height(&self) -> u64 {
        self.metrics.height
    }

    /// The reference-currency price, if a quote was found.
    pub const fn price(&self) -> Option<f64> {
        self.quote.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_block_deserializes_node_shape() {
        let json = r#"{
            "hash": "00ab",
            "height": 800000,
            "time": 1690168629,
            "tx": ["cb", "t1"],
            "nextblockhash": "00cd",
            "confirmations": 12
        }"#;
        let block: RawBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.height, 800_000);
        assert_eq!(block.coinbase_txid().map(String::as_str), Some("cb"));
        assert_eq!(block.next_hash.as_deref(), Some("00cd"));
    }

    #[test]
    fn test_raw_block_at_tip_has_no_successor() {
        let json = r#"{"hash": "00ab", "height": 1, "time": 2, "tx": []}"#;
        let block: RawBlock = serde_json::from_str(json).unwrap();
        assert!(block.next_hash.is_none());
        assert!(block.coinbase_txid().is_none());
    }

    #[test]
    fn test_total_output() {
        let tx = RawTransaction { txid: "cb".into(), output_values: vec![6.25, 0.5, 0.0] };
        assert_eq!(tx.total_output(), 6.75);
        assert_eq!(RawTransaction::default().total_output(), 0.0);
    }
}
