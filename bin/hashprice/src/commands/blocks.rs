//! Blocks Subcommand

use crate::{
    commands::write_json_lines,
    flags::{GlobalArgs, TimeRangeArgs},
};
use anyhow::Result;
use clap::Parser;
use hashprice_storage::BlockStorageReader;
use std::io;

/// The `blocks` Subcommand
///
/// Prints the committed block metrics joined with their price quotes, for the blocks whose
/// timestamp falls in `[--from, --to]`.
///
/// # Usage
///
/// ```sh
/// hashprice blocks --from 1700000000 --to 1700086400
/// ```
#[derive(Parser, Debug, Clone)]
#[command(about = "Prints committed blocks with their price quotes")]
pub(crate) struct BlocksCommand {
    /// Block timestamp range.
    #[command(flatten)]
    pub(crate) range: TimeRangeArgs,
}

impl BlocksCommand {
    /// Runs the subcommand.
    pub(crate) fn run(self, args: &GlobalArgs) -> Result<()> {
        let db = args.open_db()?;
        let rows = db.priced_blocks_in_range(self.range.from, self.range.to)?;
        write_json_lines(io::stdout().lock(), &rows)?;
        Ok(())
    }
}
