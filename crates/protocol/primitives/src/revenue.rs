//! Per-profile revenue records.

use serde::{Deserialize, Serialize};

/// One hardware profile's share of the revenue of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueAllocation {
    /// Height of the block the revenue comes from.
    pub height: u64,
    /// Identifier of the [`crate::HardwareProfile`].
    pub profile_id: String,
    /// Allocated revenue in native units.
    pub native_revenue: f64,
    /// Allocated revenue in the reference currency, absent when the block has no price.
    pub reference_revenue: Option<f64>,
    /// The block timestamp, in seconds since the Unix epoch.
    pub timestamp: u64,
}
