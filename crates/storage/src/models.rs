//! Column family layout and key encoding.
//!
//! Every value is stored as JSON. Heights are encoded big-endian so that RocksDB's byte-wise
//! key order matches numeric height order.
//!
//! | Column family | Key | Value |
//! |---|---|---|
//! | [`BLOCK_METRICS`] | height | [`hashprice_primitives::BlockMetrics`] |
//! | [`PRICE_QUOTES`] | height | [`hashprice_primitives::PriceQuote`] |
//! | [`HARDWARE_PROFILES`] | profile id | [`hashprice_primitives::HardwareProfile`] |
//! | [`REVENUE_ALLOCATIONS`] | height ‖ profile id | [`hashprice_primitives::RevenueAllocation`] |

/// Block metrics by height.
pub(crate) const BLOCK_METRICS: &str = "block_metrics";

/// Price quotes by height.
pub(crate) const PRICE_QUOTES: &str = "price_quotes";

/// Hardware profiles by identifier.
pub(crate) const HARDWARE_PROFILES: &str = "hardware_profiles";

/// Revenue allocations by height and profile identifier.
pub(crate) const REVENUE_ALLOCATIONS: &str = "revenue_allocations";

/// All column families opened by [`crate::HashpriceDb`].
pub(crate) const COLUMN_FAMILIES: [&str; 4] =
    [BLOCK_METRICS, PRICE_QUOTES, HARDWARE_PROFILES, REVENUE_ALLOCATIONS];

/// Encodes a height key.
pub(crate) const fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}

/// Decodes a key starting with a big-endian height.
pub(crate) fn decode_height(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.get(..8)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Encodes a revenue allocation key.
pub(crate) fn allocation_key(height: u64, profile_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + profile_id.len());
    key.extend_from_slice(&height_key(height));
    key.extend_from_slice(profile_id.as_bytes());
    key
}
