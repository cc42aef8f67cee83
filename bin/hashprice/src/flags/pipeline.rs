//! Pipeline flags.

use crate::flags::{ChainArgs, PriceArgs};
use hashprice_pipeline::{Orchestrator, OrchestratorConfig, PriceEnricher};
use hashprice_storage::PipelineStorage;
use std::sync::Arc;
use tracing::info;

/// Arguments shared by the commands that run the pipeline.
#[derive(Clone, Debug, clap::Args)]
pub(crate) struct PipelineArgs {
    /// Chain source arguments.
    #[command(flatten)]
    pub(crate) chain: ChainArgs,
    /// Price source arguments.
    #[command(flatten)]
    pub(crate) price: PriceArgs,
    /// Height to start from when the store is empty.
    #[arg(long, env = "HASHPRICE_START_HEIGHT")]
    pub(crate) start_height: Option<u64>,
}

impl PipelineArgs {
    /// Wires the sources and `storage` into an [`Orchestrator`].
    pub(crate) fn orchestrator(&self, storage: Arc<dyn PipelineStorage>) -> anyhow::Result<Orchestrator> {
        let chain = Arc::new(self.chain.client()?);
        let prices = Arc::new(self.price.client()?);
        let enricher = PriceEnricher::new(prices, self.price.pair())
            .with_min_query_delay(self.price.min_query_delay());

        info!(
            target: "orchestrator",
            rpc = %self.chain.rpc_url,
            pair = %enricher.pair(),
            start_height = ?self.start_height,
            "Configured pipeline"
        );

        Ok(Orchestrator::new(
            chain,
            enricher,
            storage,
            OrchestratorConfig { start_height: self.start_height },
        ))
    }
}
