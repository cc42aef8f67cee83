//! Revenue Subcommand

use crate::{
    commands::write_json_lines,
    flags::{GlobalArgs, TimeRangeArgs},
};
use anyhow::Result;
use clap::Parser;
use hashprice_storage::RevenueStorageReader;
use std::io;

/// The `revenue` Subcommand
///
/// Prints the revenue allocated to one hardware profile for the blocks whose timestamp falls
/// in `[--from, --to]`, as one JSON object per line.
///
/// # Usage
///
/// ```sh
/// hashprice revenue --profile s21_pro --from 1700000000
/// ```
#[derive(Parser, Debug, Clone)]
#[command(about = "Prints the revenue series of a hardware profile")]
pub(crate) struct RevenueCommand {
    /// Identifier of the hardware profile.
    #[arg(long)]
    pub(crate) profile: String,
    /// Block timestamp range.
    #[command(flatten)]
    pub(crate) range: TimeRangeArgs,
}

impl RevenueCommand {
    /// Runs the subcommand.
    pub(crate) fn run(self, args: &GlobalArgs) -> Result<()> {
        let db = args.open_db()?;
        let rows = db.allocations_in_range(&self.profile, self.range.from, self.range.to)?;
        write_json_lines(io::stdout().lock(), &rows)?;
        Ok(())
    }
}
