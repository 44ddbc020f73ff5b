//! In-process fakes for the selector and orchestrator seams.

use async_trait::async_trait;
use chainscan_core::{
    registry::RpcSource,
    scan::{GasPricePayload, PresentationSink, ResultAggregator, ScanCommand, ScanFetcher},
    types::{Endpoint, NetworkMode, ScanTarget},
    upstream::{LivenessProbe, ScanError},
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use tokio::sync::mpsc;

/// Fixed candidate lists keyed by `(chain, mode)`.
#[derive(Default)]
pub struct StaticSource {
    rpcs: HashMap<(String, NetworkMode), Vec<Endpoint>>,
}

impl StaticSource {
    #[must_use]
    pub fn with(mut self, chain: &str, mode: NetworkMode, urls: &[&str]) -> Self {
        self.rpcs
            .insert((chain.to_string(), mode), urls.iter().map(|u| (*u).to_string()).collect());
        self
    }
}

impl RpcSource for StaticSource {
    fn rpcs(&self, chain: &str, mode: NetworkMode) -> Vec<Endpoint> {
        self.rpcs.get(&(chain.to_string(), mode)).cloned().unwrap_or_default()
    }
}

/// Probe answering from a per-URL script of `(delay, healthy)`. Unknown URLs fail.
#[derive(Default)]
pub struct ScriptedProbe {
    script: HashMap<String, (Duration, bool)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    #[must_use]
    pub fn with(mut self, url: &str, delay_ms: u64, healthy: bool) -> Self {
        self.script.insert(url.to_string(), (Duration::from_millis(delay_ms), healthy));
        self
    }

    /// URLs probed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LivenessProbe for ScriptedProbe {
    async fn probe(&self, url: &str) -> Result<u64, ScanError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.script.get(url) {
            Some((delay, healthy)) => {
                tokio::time::sleep(*delay).await;
                if *healthy {
                    Ok(1)
                } else {
                    Err(ScanError::Network("connection refused or unreachable".to_string()))
                }
            }
            None => Err(ScanError::Network("connection refused or unreachable".to_string())),
        }
    }
}

/// One scripted fetch attempt.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Sleep, then return the payload
    Ok { delay_ms: u64, wei: u128 },
    /// Sleep, then fail with a network error
    Fail { delay_ms: u64 },
}

/// Gas fetcher answering per `(chain, mode)` from a list of attempts; the last step repeats.
#[derive(Default)]
pub struct ScriptedFetcher {
    steps: HashMap<(String, NetworkMode), Vec<Step>>,
    attempts: Mutex<HashMap<(String, NetworkMode), usize>>,
    total: AtomicUsize,
}

impl ScriptedFetcher {
    #[must_use]
    pub fn with(mut self, chain: &str, mode: NetworkMode, steps: &[Step]) -> Self {
        self.steps.insert((chain.to_string(), mode), steps.to_vec());
        self
    }

    /// Attempts made for `(chain, mode)`.
    pub fn attempts(&self, chain: &str, mode: NetworkMode) -> usize {
        self.attempts.lock().unwrap().get(&(chain.to_string(), mode)).copied().unwrap_or(0)
    }

    pub fn total_attempts(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanFetcher<GasPricePayload> for ScriptedFetcher {
    async fn fetch(
        &self,
        target: &ScanTarget,
        _endpoint: &str,
    ) -> Result<GasPricePayload, ScanError> {
        let key = (target.chain.to_string(), target.mode);
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let counter = attempts.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter - 1
        };
        self.total.fetch_add(1, Ordering::SeqCst);

        let step = self
            .steps
            .get(&key)
            .and_then(|steps| steps.get(attempt).or_else(|| steps.last()))
            .copied()
            .unwrap_or(Step::Fail { delay_ms: 0 });

        match step {
            Step::Ok { delay_ms, wei } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(GasPricePayload { wei })
            }
            Step::Fail { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(ScanError::Network("connection reset".to_string()))
            }
        }
    }
}

/// Snapshot of one rendered frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub order: Vec<String>,
    pub done: usize,
    pub complete: bool,
    pub sorted: bool,
}

/// Sink that records frames and requests one retry the first time a completed view has
/// errors. Dropping its command sender afterwards lets the session end on completion.
pub struct RetryOnceSink {
    commands: Option<mpsc::Sender<ScanCommand>>,
    retry: bool,
    pub frames: Vec<Frame>,
    pub statuses: Vec<String>,
}

impl RetryOnceSink {
    #[must_use]
    pub fn new(commands: mpsc::Sender<ScanCommand>, retry: bool) -> Self {
        Self { commands: Some(commands), retry, frames: Vec::new(), statuses: Vec::new() }
    }

    #[must_use]
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl PresentationSink<GasPricePayload> for RetryOnceSink {
    fn render(&mut self, view: &ResultAggregator<GasPricePayload>) {
        self.frames.push(Frame {
            order: view.rows().iter().map(|row| row.chain.to_string()).collect(),
            done: view.done_count(),
            complete: view.is_complete(),
            sorted: view.is_sorted(),
        });

        if view.is_complete() {
            if let Some(commands) = self.commands.take() {
                if self.retry && view.error_count() > 0 {
                    let _ = commands.try_send(ScanCommand::Retry);
                }
            }
        }
    }

    fn status(&mut self, message: &str) {
        self.statuses.push(message.to_string());
    }
}
