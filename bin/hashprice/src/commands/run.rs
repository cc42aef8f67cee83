//! Run Subcommand

use crate::{
    flags::{GlobalArgs, PipelineArgs},
    scheduler::Scheduler,
};
use clap::Parser;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_INTERVAL_SECS: u64 = 600;

/// The `run` Subcommand
///
/// Runs the pipeline every `--interval` seconds until ctrl-c is received. A run in progress
/// is always allowed to finish before the process exits. Failures that need operator
/// action, such as a missing start height on an empty store, end the command with an error.
///
/// # Usage
///
/// ```sh
/// hashprice run [FLAGS] [OPTIONS]
/// ```
#[derive(Parser, Debug, Clone)]
#[command(about = "Runs the pipeline on a fixed interval until interrupted")]
pub(crate) struct RunCommand {
    /// Pipeline arguments.
    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
    /// Seconds between the starts of two runs.
    #[arg(long, env = "HASHPRICE_INTERVAL", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub(crate) interval: u64,
}

impl RunCommand {
    /// Runs the subcommand.
    pub(crate) async fn run(self, args: &GlobalArgs) -> anyhow::Result<()> {
        let db = Arc::new(args.open_seeded_db()?);
        let orchestrator = Arc::new(self.pipeline.orchestrator(db)?);

        let cancellation = CancellationToken::new();
        let on_signal = cancellation.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(target: "scheduler", %err, "Failed to listen for ctrl-c");
                return;
            }
            info!(target: "scheduler", "Received ctrl-c, stopping after the current run");
            on_signal.cancel();
        });

        Scheduler::new(orchestrator, Duration::from_secs(self.interval)).run(cancellation).await?;
        Ok(())
    }
}
