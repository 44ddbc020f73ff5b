use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};
use tokio::time::Instant;

use crate::{
    types::Endpoint,
    upstream::{benchmark::Benchmarker, errors::ScanError},
};

/// Strategy used to pick one endpoint out of a candidate list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionAlgorithm {
    /// Benchmark every candidate and take the lowest-latency healthy one
    #[default]
    Fastest,
    /// Rotate through candidates per chain without probing
    RoundRobin,
    /// Probe candidates in priority order and take the first live one
    Failover,
}

impl SelectionAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fastest => "fastest",
            Self::RoundRobin => "round-robin",
            Self::Failover => "failover",
        }
    }
}

impl fmt::Display for SelectionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fastest" => Ok(Self::Fastest),
            "round-robin" | "roundrobin" | "round_robin" | "rr" => Ok(Self::RoundRobin),
            "failover" => Ok(Self::Failover),
            other => Err(format!(
                "unknown selection algorithm '{other}' (expected fastest, round-robin or failover)"
            )),
        }
    }
}

/// Tuning for [`EndpointSelector`].
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Per-candidate probe bound used by failover
    pub failover_probe_timeout: Duration,
    /// How long a failed URL is deprioritised by failover
    pub failover_cooldown: Duration,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            failover_probe_timeout: Duration::from_secs(2),
            failover_cooldown: Duration::from_secs(60),
        }
    }
}

/// Picks exactly one endpoint per call using a [`SelectionAlgorithm`].
///
/// Owns the round-robin cursors (one per chain key) and the failover failure memory. Both
/// live in this instance, so separate selectors never interfere with each other. Cursor
/// updates happen under the map's shard lock, which keeps concurrent callers on the same
/// chain from reading the same position.
pub struct EndpointSelector {
    benchmarker: Benchmarker,
    cursors: DashMap<String, usize>,
    failed: DashMap<Endpoint, Instant>,
    config: SelectorConfig,
}

impl EndpointSelector {
    #[must_use]
    pub fn new(benchmarker: Benchmarker) -> Self {
        Self::with_config(benchmarker, SelectorConfig::default())
    }

    #[must_use]
    pub fn with_config(benchmarker: Benchmarker, config: SelectorConfig) -> Self {
        Self { benchmarker, cursors: DashMap::new(), failed: DashMap::new(), config }
    }

    #[must_use]
    pub fn benchmarker(&self) -> &Benchmarker {
        &self.benchmarker
    }

    /// Selects one endpoint for `chain` out of `candidates`.
    ///
    /// A single candidate is returned without probing, whatever the algorithm.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Config`] if `candidates` is empty
    /// - [`ScanError::SelectionExhausted`] if every probed candidate failed; it carries the
    ///   last underlying error
    pub async fn select(
        &self,
        chain: &str,
        candidates: &[Endpoint],
        algorithm: SelectionAlgorithm,
        deadline: Duration,
    ) -> Result<Endpoint, ScanError> {
        match candidates {
            [] => Err(ScanError::Config(format!("no candidate endpoints for {chain}"))),
            [only] => {
                tracing::trace!(chain = %chain, url = %only, "single candidate, no selection");
                Ok(only.clone())
            }
            _ => match algorithm {
                SelectionAlgorithm::Fastest => {
                    self.select_fastest(chain, candidates, deadline).await
                }
                SelectionAlgorithm::RoundRobin => Ok(self.select_round_robin(chain, candidates)),
                SelectionAlgorithm::Failover => {
                    self.select_failover(chain, candidates, deadline).await
                }
            },
        }
    }

    async fn select_fastest(
        &self,
        chain: &str,
        candidates: &[Endpoint],
        deadline: Duration,
    ) -> Result<Endpoint, ScanError> {
        let results = self.benchmarker.benchmark(candidates, deadline).await;

        let best = results.iter().filter(|r| r.is_healthy()).min_by_key(|r| r.latency);
        if let Some(best) = best {
            tracing::debug!(
                chain = %chain,
                url = %best.url,
                latency_ms = best.latency.as_millis(),
                candidates = candidates.len(),
                "selected fastest endpoint"
            );
            return Ok(best.url.clone());
        }

        let last = results
            .into_iter()
            .rev()
            .find_map(|r| r.outcome.err())
            .unwrap_or_else(|| ScanError::Config(format!("no candidate endpoints for {chain}")));

        tracing::warn!(
            chain = %chain,
            attempts = candidates.len(),
            error = %last,
            "all endpoints failed benchmark"
        );
        Err(ScanError::SelectionExhausted { attempts: candidates.len(), last: Box::new(last) })
    }

    fn select_round_robin(&self, chain: &str, candidates: &[Endpoint]) -> Endpoint {
        let position = {
            let mut cursor = self.cursors.entry(chain.to_string()).or_insert(0);
            let position = *cursor;
            *cursor = cursor.wrapping_add(1);
            position
        };

        let url = &candidates[position % candidates.len()];
        tracing::debug!(chain = %chain, url = %url, cursor = position, "round-robin endpoint");
        url.clone()
    }

    /// Candidates in priority order, with URLs still inside their failure cooldown moved
    /// behind the fresh ones.
    fn failover_order<'a>(&self, candidates: &'a [Endpoint]) -> Vec<&'a Endpoint> {
        let cooldown = self.config.failover_cooldown;
        let cooling = |url: &Endpoint| {
            self.failed.get(url).is_some_and(|failed_at| failed_at.elapsed() < cooldown)
        };

        let (fresh, remembered): (Vec<&Endpoint>, Vec<&Endpoint>) =
            candidates.iter().partition(|url| !cooling(url));
        fresh.into_iter().chain(remembered).collect()
    }

    async fn select_failover(
        &self,
        chain: &str,
        candidates: &[Endpoint],
        deadline: Duration,
    ) -> Result<Endpoint, ScanError> {
        let deadline_at = Instant::now() + deadline;
        let mut attempts = 0;
        let mut last_error = None;

        for url in self.failover_order(candidates) {
            let remaining = deadline_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                last_error = Some(ScanError::Timeout(deadline));
                break;
            }

            attempts += 1;
            let probe_timeout = self.config.failover_probe_timeout.min(remaining);
            match self.benchmarker.probe_one(url, probe_timeout).await {
                Ok(block) => {
                    self.failed.remove(url);
                    tracing::debug!(
                        chain = %chain,
                        url = %url,
                        block,
                        attempts,
                        "selected failover endpoint"
                    );
                    return Ok(url.clone());
                }
                Err(e) => {
                    tracing::debug!(
                        chain = %chain,
                        url = %url,
                        error = %e,
                        "failover candidate failed"
                    );
                    self.failed.insert(url.clone(), Instant::now());
                    last_error = Some(e);
                }
            }
        }

        let last = last_error
            .unwrap_or_else(|| ScanError::Config(format!("no candidate endpoints for {chain}")));
        tracing::warn!(chain = %chain, attempts, error = %last, "all failover candidates failed");
        Err(ScanError::SelectionExhausted { attempts, last: Box::new(last) })
    }

    /// Returns `true` if failover currently deprioritises `url`.
    #[must_use]
    pub fn is_cooling_down(&self, url: &str) -> bool {
        self.failed
            .get(url)
            .is_some_and(|failed_at| failed_at.elapsed() < self.config.failover_cooldown)
    }
}
