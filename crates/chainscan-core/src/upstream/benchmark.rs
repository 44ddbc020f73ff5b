use async_trait::async_trait;
use futures::future::join_all;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

use crate::{types::Endpoint, upstream::errors::ScanError};

/// A minimal reachability check against one endpoint.
///
/// Returns a liveness value (block height for JSON-RPC endpoints). Implementations must not
/// fetch domain data; the probe only exists to measure latency.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<u64, ScanError>;
}

/// Outcome of probing one candidate endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkResult {
    pub url: Endpoint,
    /// Wall-clock time from dispatch to response, or until failure/timeout
    pub latency: Duration,
    /// Liveness value on success
    pub outcome: Result<u64, ScanError>,
}

impl BenchmarkResult {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn block(&self) -> Option<u64> {
        self.outcome.as_ref().ok().copied()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ScanError> {
        self.outcome.as_ref().err()
    }
}

/// Orders results healthy-first by ascending latency; failures keep their relative order.
pub fn sort_fastest_first(results: &mut [BenchmarkResult]) {
    results.sort_by(|a, b| match (a.is_healthy(), b.is_healthy()) {
        (true, true) => a.latency.cmp(&b.latency),
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        (false, false) => std::cmp::Ordering::Equal,
    });
}

/// Probes candidate endpoints concurrently.
///
/// Every probe runs as its own future under its own deadline, so a dead endpoint only
/// costs its own slot in the output.
#[derive(Clone)]
pub struct Benchmarker {
    probe: Arc<dyn LivenessProbe>,
}

impl Benchmarker {
    pub fn new(probe: Arc<dyn LivenessProbe>) -> Self {
        Self { probe }
    }

    /// Benchmarks `urls`, returning exactly one result per input in input order.
    ///
    /// Each probe is bounded by `timeout`; one that exceeds it yields
    /// [`ScanError::Timeout`] with the latency consumed so far. Empty input returns an empty
    /// vector.
    pub async fn benchmark(&self, urls: &[Endpoint], timeout: Duration) -> Vec<BenchmarkResult> {
        if urls.is_empty() {
            return Vec::new();
        }

        let futures = urls.iter().map(|url| {
            let probe = Arc::clone(&self.probe);
            async move {
                let started = Instant::now();
                let outcome = match tokio::time::timeout(timeout, probe.probe(url)).await {
                    Ok(result) => result,
                    Err(_elapsed) => Err(ScanError::Timeout(timeout)),
                };
                let latency = started.elapsed();

                tracing::trace!(
                    url = %url,
                    latency_ms = latency.as_millis(),
                    healthy = outcome.is_ok(),
                    "probe finished"
                );

                BenchmarkResult { url: url.clone(), latency, outcome }
            }
        });

        join_all(futures).await
    }

    /// Probes a single endpoint. Used by failover for per-candidate checks.
    pub async fn probe_one(&self, url: &str, timeout: Duration) -> Result<u64, ScanError> {
        match tokio::time::timeout(timeout, self.probe.probe(url)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ScanError::Timeout(timeout)),
        }
    }
}
