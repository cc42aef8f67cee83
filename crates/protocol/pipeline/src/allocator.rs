//! Revenue allocation across hardware profiles.

use hashprice_primitives::{HardwareProfile, PricedBlock, RevenueAllocation};
use tracing::trace;

/// Watt-hours in one megawatt-hour.
pub const WATT_HOURS_PER_MWH: f64 = 1_000_000.0;

/// Splits the revenue of a block across hardware profiles.
///
/// A profile is scaled to the number of its machines that one megawatt of power runs, and
/// that fleet's hash rate is weighed against the network's. The fleet is counted as additional
/// to the network hash rate, so the share is `fleet / (network + fleet)`. When both are zero
/// the share is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevenueAllocator;

impl RevenueAllocator {
    /// Computes the allocation of `block` for a single profile.
    pub fn allocate_profile(&self, block: &PricedBlock, profile: &HardwareProfile) -> RevenueAllocation {
        let metrics = &block.metrics;
        let units_per_mwh = WATT_HOURS_PER_MWH / profile.power_watts;
        let fleet_hash_rate = profile.hash_rate * units_per_mwh;
        let total_hash_rate = metrics.network_hash_rate + fleet_hash_rate;
        let share_of_network =
            if total_hash_rate > 0.0 { fleet_hash_rate / total_hash_rate } else { 0.0 };
        let native_revenue = metrics.block_revenue() * share_of_network;
        let reference_revenue = block.price().map(|price| native_revenue * price);

        trace!(
            target: "allocator",
            height = metrics.height,
            profile = %profile.id,
            share_of_network,
            native_revenue,
            "Allocated block revenue"
        );

        RevenueAllocation {
            height: metrics.height,
            profile_id: profile.id.clone(),
            native_revenue,
            reference_revenue,
            timestamp: metrics.timestamp,
        }
    }

    /// Computes one allocation per profile, in the order of `profiles`.
    pub fn allocate(&self, block: &PricedBlock, profiles: &[HardwareProfile]) -> Vec<RevenueAllocation> {
        profiles.iter().map(|profile| self.allocate_profile(block, profile)).collect()
    }
}
