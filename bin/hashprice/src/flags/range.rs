//! Time range flags of the read commands.

/// An inclusive range of block timestamps, in seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, clap::Args)]
pub(crate) struct TimeRangeArgs {
    /// Earliest block timestamp to include.
    #[arg(long, default_value_t = 0)]
    pub(crate) from: u64,
    /// Latest block timestamp to include.
    #[arg(long, default_value_t = u64::MAX)]
    pub(crate) to: u64,
}
