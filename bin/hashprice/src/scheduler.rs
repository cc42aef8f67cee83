//! Periodic pipeline runs.

use hashprice_pipeline::{Orchestrator, PipelineError};
use std::{sync::Arc, time::Duration};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Triggers a pipeline run on a fixed interval.
///
/// Each run is awaited before the next tick is taken, and ticks missed while a run was in
/// progress are skipped. Cancellation is only observed between runs. A failure the next run
/// cannot recover from without operator action stops the scheduler.
#[derive(Debug)]
pub(crate) struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    period: Duration,
}

impl Scheduler {
    /// Creates a new [`Scheduler`].
    pub(crate) const fn new(orchestrator: Arc<Orchestrator>, period: Duration) -> Self {
        Self { orchestrator, period }
    }

    /// Runs until `cancellation` fires or a run fails with a non-retryable error. Returns the
    /// number of runs triggered.
    pub(crate) async fn run(self, cancellation: CancellationToken) -> Result<u64, PipelineError> {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut runs = 0;

        info!(target: "scheduler", period_secs = self.period.as_secs(), "Starting scheduler");
        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                _ = ticker.tick() => {}
            }

            runs += 1;
            match self.orchestrator.run().await {
                Ok(report) => info!(
                    target: "scheduler",
                    outcome = report.outcome.as_str(),
                    committed = report.committed,
                    "Scheduled run finished"
                ),
                Err(err) if err.is_retryable() => {
                    warn!(target: "scheduler", %err, "Scheduled run failed, retrying next tick")
                }
                Err(err) => {
                    error!(target: "scheduler", %err, runs, "Scheduled run failed, stopping");
                    return Err(err);
                }
            }
        }

        info!(target: "scheduler", runs, "Scheduler stopped");
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashprice_pipeline::{
        OrchestratorConfig, PriceEnricher,
        test_utils::{InMemoryStorage, TestChainSource, TestPriceSource},
    };
    use hashprice_primitives::CurrencyPair;
    use hashprice_storage::BlockStorageReader;

    fn orchestrator(
        chain: Arc<TestChainSource>,
        storage: Arc<InMemoryStorage>,
        delay: Duration,
    ) -> Arc<Orchestrator> {
        orchestrator_from(chain, storage, delay, Some(1))
    }

    fn orchestrator_from(
        chain: Arc<TestChainSource>,
        storage: Arc<InMemoryStorage>,
        delay: Duration,
        start_height: Option<u64>,
    ) -> Arc<Orchestrator> {
        let enricher =
            PriceEnricher::new(Arc::new(TestPriceSource::centered(1.0)), CurrencyPair::default())
                .with_min_query_delay(delay);
        Arc::new(Orchestrator::new(
            chain,
            enricher,
            storage,
            OrchestratorConfig { start_height },
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_on_every_tick_until_cancelled() {
        let chain = Arc::new(TestChainSource::new(0..=2));
        let storage = Arc::new(InMemoryStorage::new());
        let scheduler =
            Scheduler::new(orchestrator(chain.clone(), storage.clone(), Duration::ZERO), Duration::from_secs(600));
        let cancellation = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(cancellation.clone()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(storage.latest_height().unwrap(), Some(2));

        chain.extend_to(4);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(storage.latest_height().unwrap(), Some(4));

        cancellation.cancel();
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_waits_for_run_in_progress() {
        let chain = Arc::new(TestChainSource::new(0..=3));
        let storage = Arc::new(InMemoryStorage::new());
        let scheduler = Scheduler::new(
            orchestrator(chain, storage.clone(), Duration::from_secs(12)),
            Duration::from_secs(600),
        );
        let cancellation = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(cancellation.clone()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancellation.cancel();

        assert_eq!(handle.await.unwrap().unwrap(), 1);
        assert_eq!(storage.latest_height().unwrap(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ticks_are_skipped() {
        let chain = Arc::new(TestChainSource::new(0..=10));
        let storage = Arc::new(InMemoryStorage::new());
        // Ten blocks at 12 s each take 120 s, twice the period.
        let scheduler = Scheduler::new(
            orchestrator(chain, storage, Duration::from_secs(12)),
            Duration::from_secs(60),
        );
        let cancellation = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(cancellation.clone()));

        tokio::time::sleep(Duration::from_secs(150)).await;
        cancellation.cancel();

        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_without_start_height() {
        let chain = Arc::new(TestChainSource::new(0..=3));
        let storage = Arc::new(InMemoryStorage::new());
        let scheduler = Scheduler::new(
            orchestrator_from(chain, storage.clone(), Duration::ZERO, None),
            Duration::from_secs(600),
        );

        let result = scheduler.run(CancellationToken::new()).await;

        assert!(matches!(result, Err(PipelineError::MissingStartHeight)));
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_running_after_transient_failure() {
        let chain = Arc::new(TestChainSource::new(0..=3));
        chain.fail_block_at(2);
        let storage = Arc::new(InMemoryStorage::new());
        let scheduler = Scheduler::new(
            orchestrator(chain.clone(), storage.clone(), Duration::ZERO),
            Duration::from_secs(600),
        );
        let cancellation = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(cancellation.clone()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(storage.latest_height().unwrap(), Some(1));

        chain.clear_failures();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(storage.latest_height().unwrap(), Some(3));

        cancellation.cancel();
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }
}
