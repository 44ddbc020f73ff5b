use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time::Instant};

use crate::{
    registry::RpcSource,
    scan::fetchers::ScanFetcher,
    types::{Endpoint, ScanTarget},
    upstream::{EndpointSelector, ScanError, SelectionAlgorithm},
};

/// One (re)dispatch of a target, tagged with the generation its result must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub target: ScanTarget,
    pub generation: u64,
}

/// The single message a fetch task emits for its dispatch.
#[derive(Debug, Clone)]
pub struct ScanResult<P> {
    pub target: ScanTarget,
    pub generation: u64,
    pub outcome: Result<P, ScanError>,
    /// Time from task start to result, selection included
    pub latency: Duration,
    /// Endpoint that served the fetch, if selection got that far
    pub endpoint: Option<Endpoint>,
}

/// Timeouts and algorithm for one scan.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub algorithm: SelectionAlgorithm,
    /// Bound on selection plus fetch for one target
    pub target_timeout: Duration,
    /// Deadline handed to the selector
    pub selection_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            algorithm: SelectionAlgorithm::default(),
            target_timeout: Duration::from_secs(8),
            selection_timeout: Duration::from_secs(5),
        }
    }
}

/// Fans scan targets out to independent tasks.
///
/// Holds no per-scan bookkeeping: progress, completion and retry all live in the
/// aggregator, and a retry is just another call to [`Self::dispatch`].
pub struct ScanOrchestrator {
    selector: Arc<EndpointSelector>,
    source: Arc<dyn RpcSource>,
    config: OrchestratorConfig,
}

impl ScanOrchestrator {
    pub fn new(
        selector: Arc<EndpointSelector>,
        source: Arc<dyn RpcSource>,
        config: OrchestratorConfig,
    ) -> Self {
        Self { selector, source, config }
    }

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Spawns one task per dispatch. Every task sends exactly one [`ScanResult`] on `sink`.
    ///
    /// A send into a closed channel is ignored, so tasks outliving the consumer are harmless.
    pub fn dispatch<P>(
        &self,
        dispatches: Vec<Dispatch>,
        fetcher: &Arc<dyn ScanFetcher<P>>,
        sink: &UnboundedSender<ScanResult<P>>,
    ) -> Vec<JoinHandle<()>>
    where
        P: Send + 'static,
    {
        tracing::debug!(
            targets = dispatches.len(),
            algorithm = %self.config.algorithm,
            "dispatching scan targets"
        );

        dispatches
            .into_iter()
            .map(|dispatch| {
                let selector = Arc::clone(&self.selector);
                let source = Arc::clone(&self.source);
                let fetcher = Arc::clone(fetcher);
                let sink = sink.clone();
                let config = self.config.clone();

                tokio::spawn(async move {
                    let result = run_target(
                        dispatch,
                        &selector,
                        source.as_ref(),
                        fetcher.as_ref(),
                        &config,
                    )
                    .await;
                    let _ = sink.send(result);
                })
            })
            .collect()
    }
}

async fn run_target<P>(
    dispatch: Dispatch,
    selector: &EndpointSelector,
    source: &dyn RpcSource,
    fetcher: &dyn ScanFetcher<P>,
    config: &OrchestratorConfig,
) -> ScanResult<P> {
    let Dispatch { target, generation } = dispatch;
    let started = Instant::now();
    let mut chosen: Option<Endpoint> = None;

    let work = async {
        let candidates = source.rpcs(&target.chain, target.mode);
        if candidates.is_empty() {
            return Err(ScanError::no_endpoints(&target.chain, target.mode));
        }

        let selection_deadline = config.selection_timeout.min(config.target_timeout);
        let endpoint = selector
            .select(&target.chain, &candidates, config.algorithm, selection_deadline)
            .await?;
        chosen = Some(endpoint.clone());

        fetcher.fetch(&target, &endpoint).await
    };

    let outcome = match tokio::time::timeout(config.target_timeout, work).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => Err(ScanError::Timeout(config.target_timeout)),
    };
    let latency = started.elapsed();

    match &outcome {
        Ok(_) => tracing::debug!(
            scan_target = %target,
            generation,
            latency_ms = latency.as_millis(),
            url = chosen.as_deref().unwrap_or("-"),
            "scan target done"
        ),
        Err(e) => tracing::debug!(
            scan_target = %target,
            generation,
            latency_ms = latency.as_millis(),
            error = %e,
            "scan target failed"
        ),
    }

    ScanResult { target, generation, outcome, latency, endpoint: chosen }
}
