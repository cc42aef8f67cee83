//! The block subsidy halving schedule.

/// Number of satoshis in one native coin.
pub const SATS_PER_COIN: u64 = 100_000_000;

/// The subsidy paid by the first block, in satoshis.
pub const BASE_SUBSIDY_SATS: u64 = 50 * SATS_PER_COIN;

/// Number of blocks between two subsidy halvings.
pub const HALVING_INTERVAL: u64 = 210_000;

/// Once this many halvings have happened, the subsidy is zero.
pub const MAX_HALVINGS: u64 = 64;

/// Returns the block subsidy at `height` in satoshis.
///
/// The base subsidy is shifted right once per elapsed halving interval. Shifting a `u64` by
/// 64 or more bits is undefined for the `>>` operator, so the subsidy is pinned to zero from
/// the 64th halving onward.
pub const fn block_subsidy_sats(height: u64) -> u64 {
    let halvings = height / HALVING_INTERVAL;
    if halvings >= MAX_HALVINGS {
        return 0;
    }
    BASE_SUBSIDY_SATS >> halvings
}

/// Returns the block subsidy at `height` in native units.
///
/// The division to native precision happens once, after the integer halving.
pub fn block_subsidy(height: u64) -> f64 {
    block_subsidy_sats(height) as f64 / SATS_PER_COIN as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::genesis(0, 50.0)]
    #[case::last_block_of_first_era(209_999, 50.0)]
    #[case::first_halving(210_000, 25.0)]
    #[case::second_halving(420_000, 12.5)]
    #[case::fourth_halving(840_000, 3.125)]
    #[case::sixty_fourth_halving(210_000 * 64, 0.0)]
    #[case::far_future(210_000 * 100, 0.0)]
    fn test_block_subsidy(#[case] height: u64, #[case] expected: f64) {
        assert_eq!(block_subsidy(height), expected);
    }

    #[test]
    fn test_subsidy_halves_at_every_interval() {
        for era in 1..MAX_HALVINGS {
            let before = block_subsidy_sats(era * HALVING_INTERVAL - 1);
            let after = block_subsidy_sats(era * HALVING_INTERVAL);
            assert_eq!(after, before / 2, "era {era}");
        }
    }

    #[test]
    fn test_subsidy_reaches_zero_before_the_cap() {
        // 5e9 sats has 33 significant bits, so integer halving hits zero long before the cap.
        assert_eq!(block_subsidy_sats(33 * HALVING_INTERVAL), 0);
        assert_eq!(block_subsidy_sats(32 * HALVING_INTERVAL), 1);
    }
}
