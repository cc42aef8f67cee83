//! Once Subcommand

use crate::flags::{GlobalArgs, PipelineArgs};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

/// The `once` Subcommand
///
/// Runs the pipeline a single time, from the resume height to the chain tip, and exits.
///
/// # Usage
///
/// ```sh
/// hashprice once [FLAGS] [OPTIONS]
/// ```
#[derive(Parser, Debug, Clone)]
#[command(about = "Runs the pipeline once, up to the current chain tip")]
pub(crate) struct OnceCommand {
    /// Pipeline arguments.
    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

impl OnceCommand {
    /// Runs the subcommand.
    pub(crate) async fn run(self, args: &GlobalArgs) -> anyhow::Result<()> {
        let db = Arc::new(args.open_seeded_db()?);
        let orchestrator = self.pipeline.orchestrator(db)?;
        let report = orchestrator.run().await?;
        info!(
            target: "orchestrator",
            outcome = report.outcome.as_str(),
            committed = report.committed,
            last_height = ?report.last_height,
            "Done"
        );
        Ok(())
    }
}
