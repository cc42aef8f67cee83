//! The pipeline orchestrator.
//!
//! A run moves through [`RunState`]s: it first determines the height to resume from, then
//! streams blocks from that height to the end of the chain, committing each one before the
//! next is pulled. Any error fails the run at the height being processed. Heights committed
//! before the failure stay valid, so the next run resumes exactly where this one stopped.

use crate::{
    ChainSource, MetricsExtractor, PipelineError, PipelineResult, PriceEnricher, RevenueAllocator,
    metrics::Metrics,
    stream::{amap, walk},
};
use futures::StreamExt;
use hashprice_primitives::{BlockHash, RawBlock};
use hashprice_storage::{HeightCommit, PipelineStorage};
use std::{fmt, pin::pin, sync::Arc, time::Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace};

/// Configuration for the [`Orchestrator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// The height to start from when nothing has been committed yet.
    pub start_height: Option<u64>,
}

/// The states of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Reading the latest committed height and the chain tip.
    DetermineResume,
    /// Pulling, enriching, and committing blocks.
    Streaming,
    /// The run finished; nothing is left to do until the chain advances.
    Idle,
    /// The run stopped on an error.
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetermineResume => write!(f, "determine_resume"),
            Self::Streaming => write!(f, "streaming"),
            Self::Idle => write!(f, "idle"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How a successful call to [`Orchestrator::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The store already covered the chain tip. Nothing was written.
    UpToDate,
    /// Blocks were streamed until the end of the chain.
    Completed,
    /// Another run was in progress. Nothing was read or written.
    Skipped,
}

impl RunOutcome {
    /// The metrics label of the outcome.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpToDate => "up_to_date",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// The first height the run tried to process, if it got that far.
    pub resume_height: Option<u64>,
    /// Number of heights committed by the run.
    pub committed: u64,
    /// The last height committed by the run.
    pub last_height: Option<u64>,
}

impl RunReport {
    const fn new(outcome: RunOutcome) -> Self {
        Self { outcome, resume_height: None, committed: 0, last_height: None }
    }
}

/// Drives the pipeline: resume, stream, extract, enrich, allocate, commit.
#[derive(Debug)]
pub struct Orchestrator {
    chain: Arc<dyn ChainSource>,
    extractor: MetricsExtractor,
    enricher: PriceEnricher,
    allocator: RevenueAllocator,
    storage: Arc<dyn PipelineStorage>,
    config: OrchestratorConfig,
    run_lock: Mutex<()>,
}

impl Orchestrator {
    /// Creates a new [`Orchestrator`].
    pub fn new(
        chain: Arc<dyn ChainSource>,
        enricher: PriceEnricher,
        storage: Arc<dyn PipelineStorage>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            extractor: MetricsExtractor::new(Arc::clone(&chain)),
            chain,
            enricher,
            allocator: RevenueAllocator,
            storage,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Runs the pipeline from the resume height to the end of the chain.
    ///
    /// At most one run executes at a time; a call made while another run is active returns
    /// [`RunOutcome::Skipped`] immediately.
    pub async fn run(&self) -> PipelineResult<RunReport> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            info!(target: "orchestrator", "Run already in progress, skipping");
            Metrics::record_run(RunOutcome::Skipped.as_str(), Default::default());
            return Ok(RunReport::new(RunOutcome::Skipped));
        };

        let started = Instant::now();
        let mut report = RunReport::new(RunOutcome::Completed);
        let result = self.run_inner(&mut report).await;

        match &result {
            Ok(()) => {
                Metrics::record_run(report.outcome.as_str(), started.elapsed());
                info!(
                    target: "orchestrator",
                    state = %RunState::Idle,
                    outcome = report.outcome.as_str(),
                    committed = report.committed,
                    last_height = ?report.last_height,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Run finished"
                );
            }
            Err(err) => {
                Metrics::record_run("failed", started.elapsed());
                error!(
                    target: "orchestrator",
                    state = %RunState::Failed,
                    %err,
                    retryable = err.is_retryable(),
                    committed = report.committed,
                    last_height = ?report.last_height,
                    "Run failed"
                );
            }
        }

        result.map(|()| report)
    }

    async fn run_inner(&self, report: &mut RunReport) -> PipelineResult<()> {
        debug!(target: "orchestrator", state = %RunState::DetermineResume, "Starting run");
        let Some(resume) = self.determine_resume().await? else {
            report.outcome = RunOutcome::UpToDate;
            return Ok(());
        };
        report.resume_height = Some(resume);
        self.stream_from(resume, report).await
    }

    /// Returns the first height to process, or `None` if the store already covers the tip.
    async fn determine_resume(&self) -> PipelineResult<Option<u64>> {
        let resume = match self.storage.latest_height()? {
            Some(latest) => latest + 1,
            None => self.config.start_height.ok_or(PipelineError::MissingStartHeight)?,
        };
        let tip = self.chain.tip_height().await?;
        if resume > tip {
            debug!(target: "orchestrator", resume, tip, "Nothing to do");
            return Ok(None);
        }
        info!(target: "orchestrator", resume, tip, "Resuming");
        Ok(Some(resume))
    }

    async fn stream_from(&self, resume: u64, report: &mut RunReport) -> PipelineResult<()> {
        let profiles = self.storage.hardware_profiles()?;
        let seed = self.chain.block_hash(resume).await?;
        debug!(
            target: "orchestrator",
            state = %RunState::Streaming,
            resume,
            profiles = profiles.len(),
            "Streaming blocks"
        );

        let chain = Arc::clone(&self.chain);
        let blocks = walk(
            seed,
            move |hash: BlockHash| {
                let chain = Arc::clone(&chain);
                async move {
                    trace!(target: "walker", %hash, "Fetching block");
                    chain.block(&hash).await.map_err(PipelineError::from)
                }
            },
            |block: &RawBlock| block.next_hash.clone(),
        );
        let extracted = amap(blocks, |block| self.extractor.extract(block));
        let mut priced = pin!(amap(extracted, |metrics| self.enricher.enrich(metrics)));

        while let Some(block) = priced.next().await {
            let block = block?;
            let height = block.height();
            let allocations = self.allocator.allocate(&block, &profiles);
            let written = allocations.len();

            self.storage.commit_height(HeightCommit { block, allocations })?;
            Metrics::record_commit(height, written);
            debug!(target: "orchestrator", height, allocations = written, "Committed height");

            report.committed += 1;
            report.last_height = Some(height);
        }

        Ok(())
    }
}
