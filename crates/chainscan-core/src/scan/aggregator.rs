//! Single-owner scan state.
//!
//! The aggregator is the only writer of row state. Fetch tasks never touch rows; they send a
//! [`ScanResult`] which the consumer loop feeds to [`ResultAggregator::apply`] one at a time.
//!
//! # Sub-row lifecycle
//!
//! ```text
//!            dispatch / retry
//!   ┌──────────────────────────────┐
//!   ▼                              │
//! Fetching ──result ok──► Done     │
//!     │                            │
//!     └────result err───► Error ───┘
//! ```
//!
//! Every dispatch stamps the sub-row with a fresh generation. A result whose generation does
//! not match the sub-row's current one (or that arrives after the sub-row already left
//! `Fetching`) is stale and dropped without touching counters.

use std::{collections::HashMap, time::Duration};

use crate::{
    scan::{
        ordering::{sort_rows, RowOrdering},
        orchestrator::{Dispatch, ScanResult},
    },
    types::{ChainKey, Endpoint, NetworkMode, ScanTarget},
    upstream::ScanError,
    utils::clean_error,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Fetching,
    Done,
    Error,
}

/// State of one chain+mode within a display row.
#[derive(Debug, Clone)]
pub struct SubRow<P> {
    pub status: RowStatus,
    pub payload: Option<P>,
    pub latency: Option<Duration>,
    /// Cleaned, truncated error text; set only while `status` is `Error`
    pub error: Option<String>,
    pub endpoint: Option<Endpoint>,
    pub generation: u64,
}

impl<P> SubRow<P> {
    fn new() -> Self {
        Self {
            status: RowStatus::Fetching,
            payload: None,
            latency: None,
            error: None,
            endpoint: None,
            generation: 0,
        }
    }

    fn reset(&mut self, generation: u64) {
        self.status = RowStatus::Fetching;
        self.payload = None;
        self.latency = None;
        self.error = None;
        self.endpoint = None;
        self.generation = generation;
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status != RowStatus::Fetching
    }
}

/// Read-only projection of a row's sub-row statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinedStatus {
    /// At least one sub-row is still in flight
    Fetching,
    /// Every sub-row is done
    Done,
    /// Every sub-row failed
    Error,
    /// Settled with a mix of done and failed sub-rows
    HalfDone,
}

impl CombinedStatus {
    /// Status label; dual rows use the `both-` forms.
    #[must_use]
    pub fn label(&self, dual: bool) -> &'static str {
        match (self, dual) {
            (Self::Fetching, _) => "fetching",
            (Self::HalfDone, _) => "half-done",
            (Self::Done, true) => "both-done",
            (Self::Done, false) => "done",
            (Self::Error, true) => "both-error",
            (Self::Error, false) => "error",
        }
    }
}

/// One display row: a chain with a sub-row per scanned network mode.
#[derive(Debug, Clone)]
pub struct ScanRow<P> {
    pub chain: ChainKey,
    pub display_name: String,
    pub currency: String,
    pub mainnet: Option<SubRow<P>>,
    pub testnet: Option<SubRow<P>>,
}

impl<P> ScanRow<P> {
    #[must_use]
    pub fn sub_row(&self, mode: NetworkMode) -> Option<&SubRow<P>> {
        match mode {
            NetworkMode::Mainnet => self.mainnet.as_ref(),
            NetworkMode::Testnet => self.testnet.as_ref(),
        }
    }

    fn sub_row_mut(&mut self, mode: NetworkMode) -> Option<&mut SubRow<P>> {
        match mode {
            NetworkMode::Mainnet => self.mainnet.as_mut(),
            NetworkMode::Testnet => self.testnet.as_mut(),
        }
    }

    /// Present sub-rows, mainnet first.
    pub fn sub_rows(&self) -> impl Iterator<Item = (NetworkMode, &SubRow<P>)> {
        [
            (NetworkMode::Mainnet, self.mainnet.as_ref()),
            (NetworkMode::Testnet, self.testnet.as_ref()),
        ]
        .into_iter()
        .filter_map(|(mode, sub)| sub.map(|sub| (mode, sub)))
    }

    #[must_use]
    pub fn is_dual(&self) -> bool {
        self.mainnet.is_some() && self.testnet.is_some()
    }

    #[must_use]
    pub fn combined_status(&self) -> CombinedStatus {
        let mut done = 0;
        let mut errors = 0;
        for (_, sub) in self.sub_rows() {
            match sub.status {
                RowStatus::Fetching => return CombinedStatus::Fetching,
                RowStatus::Done => done += 1,
                RowStatus::Error => errors += 1,
            }
        }

        match (done, errors) {
            (_, 0) => CombinedStatus::Done,
            (0, _) => CombinedStatus::Error,
            _ => CombinedStatus::HalfDone,
        }
    }
}

/// Display text for a failed sub-row.
///
/// Exhausted selections show their last underlying cause, with the attempt count trailing so
/// truncation cuts the count before the cause.
fn row_error_text(error: &ScanError, max_len: usize) -> String {
    match error {
        ScanError::SelectionExhausted { attempts, .. } => {
            let cause = clean_error(&error.last_cause().to_string(), 0);
            clean_error(&format!("{cause} ({attempts} endpoints)"), max_len)
        }
        other => clean_error(&other.to_string(), max_len),
    }
}

/// What [`ResultAggregator::apply`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Written to its sub-row; `done_count` advanced
    Accepted,
    /// Superseded generation or duplicate; dropped
    Stale,
    /// No row exists for the target; dropped
    Unknown,
}

/// Owns every row of one scan session.
#[derive(Debug)]
pub struct ResultAggregator<P> {
    rows: Vec<ScanRow<P>>,
    index: HashMap<ChainKey, usize>,
    total_expected: usize,
    done_count: usize,
    sorted: bool,
    next_generation: u64,
    error_max_len: usize,
    stale_dropped: u64,
}

impl<P> ResultAggregator<P> {
    /// Creates an empty aggregator; `error_max_len` bounds row error text (0 = unbounded).
    #[must_use]
    pub fn new(error_max_len: usize) -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
            total_expected: 0,
            done_count: 0,
            sorted: false,
            next_generation: 1,
            error_max_len,
            stale_dropped: 0,
        }
    }

    /// Registers a target before the scan starts. Targets of the same chain share one row.
    ///
    /// Registering the same target twice has no effect.
    pub fn register(&mut self, target: &ScanTarget, display_name: &str, currency: &str) {
        let position = match self.index.get(&target.chain) {
            Some(position) => *position,
            None => {
                self.rows.push(ScanRow {
                    chain: target.chain.clone(),
                    display_name: display_name.to_string(),
                    currency: currency.to_string(),
                    mainnet: None,
                    testnet: None,
                });
                let position = self.rows.len() - 1;
                self.index.insert(target.chain.clone(), position);
                position
            }
        };

        let row = &mut self.rows[position];
        let slot = match target.mode {
            NetworkMode::Mainnet => &mut row.mainnet,
            NetworkMode::Testnet => &mut row.testnet,
        };
        if slot.is_none() {
            *slot = Some(SubRow::new());
            self.total_expected += 1;
        }
    }

    /// Moves every sub-row to `Fetching` with a fresh generation and returns the dispatches.
    pub fn start(&mut self) -> Vec<Dispatch> {
        self.done_count = 0;
        self.sorted = false;

        let mut dispatches = Vec::with_capacity(self.total_expected);
        for row in &mut self.rows {
            for mode in [NetworkMode::Mainnet, NetworkMode::Testnet] {
                if let Some(sub) = row.sub_row_mut(mode) {
                    let generation = self.next_generation;
                    self.next_generation += 1;
                    sub.reset(generation);
                    dispatches.push(Dispatch {
                        target: ScanTarget { chain: row.chain.clone(), mode },
                        generation,
                    });
                }
            }
        }

        tracing::info!(targets = dispatches.len(), rows = self.rows.len(), "scan started");
        dispatches
    }

    /// Applies one result message.
    ///
    /// Only a result matching the sub-row's current generation while it is `Fetching` is
    /// written; anything else is dropped and counted.
    pub fn apply(&mut self, result: ScanResult<P>) -> ApplyOutcome {
        let Some(position) = self.index.get(&result.target.chain).copied() else {
            tracing::warn!(scan_target = %result.target, "result for unknown row dropped");
            return ApplyOutcome::Unknown;
        };
        let error_max_len = self.error_max_len;
        let Some(sub) = self.rows[position].sub_row_mut(result.target.mode) else {
            tracing::warn!(scan_target = %result.target, "result for unregistered mode dropped");
            return ApplyOutcome::Unknown;
        };

        if sub.generation != result.generation || sub.is_settled() {
            tracing::debug!(
                scan_target = %result.target,
                generation = result.generation,
                current = sub.generation,
                "stale result dropped"
            );
            self.stale_dropped += 1;
            return ApplyOutcome::Stale;
        }

        sub.latency = Some(result.latency);
        sub.endpoint = result.endpoint;
        match result.outcome {
            Ok(payload) => {
                sub.payload = Some(payload);
                sub.status = RowStatus::Done;
            }
            Err(e) => {
                sub.error = Some(row_error_text(&e, error_max_len));
                sub.status = RowStatus::Error;
            }
        }
        self.done_count += 1;

        ApplyOutcome::Accepted
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.done_count == self.total_expected
    }

    /// Sorts rows once per completion. Returns `true` if a sort happened.
    ///
    /// Calls before completion, or after the sort already ran with no retry since, are
    /// no-ops.
    pub fn sort_if_complete(&mut self, ordering: &dyn RowOrdering<P>) -> bool {
        if !self.is_complete() || self.sorted {
            return false;
        }

        sort_rows(&mut self.rows, ordering);
        self.rebuild_index();
        self.sorted = true;

        tracing::info!(
            rows = self.rows.len(),
            errors = self.error_count(),
            "scan complete, rows sorted"
        );
        true
    }

    /// Moves every `Error` sub-row back to `Fetching` and returns their new dispatches.
    ///
    /// `Done` and in-flight sub-rows are untouched. Clears the sorted flag when anything was
    /// retried.
    pub fn retry_failed(&mut self) -> Vec<Dispatch> {
        let mut dispatches = Vec::new();
        for row in &mut self.rows {
            for mode in [NetworkMode::Mainnet, NetworkMode::Testnet] {
                let Some(sub) = row.sub_row_mut(mode) else { continue };
                if sub.status != RowStatus::Error {
                    continue;
                }

                let generation = self.next_generation;
                self.next_generation += 1;
                sub.reset(generation);
                self.done_count -= 1;
                dispatches.push(Dispatch {
                    target: ScanTarget { chain: row.chain.clone(), mode },
                    generation,
                });
            }
        }

        if !dispatches.is_empty() {
            self.sorted = false;
            tracing::info!(retried = dispatches.len(), "retrying failed targets");
        }
        dispatches
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (position, row) in self.rows.iter().enumerate() {
            self.index.insert(row.chain.clone(), position);
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[ScanRow<P>] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, chain: &str) -> Option<&ScanRow<P>> {
        self.index.get(chain).map(|position| &self.rows[*position])
    }

    #[must_use]
    pub fn total_expected(&self) -> usize {
        self.total_expected
    }

    #[must_use]
    pub fn done_count(&self) -> usize {
        self.done_count
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Number of results dropped as stale or duplicate.
    #[must_use]
    pub fn stale_dropped(&self) -> u64 {
        self.stale_dropped
    }

    /// Number of sub-rows currently in `Error`.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(ScanRow::sub_rows)
            .filter(|(_, sub)| sub.status == RowStatus::Error)
            .count()
    }

    /// `true` if any row carries both a mainnet and a testnet sub-row.
    #[must_use]
    pub fn is_dual(&self) -> bool {
        self.rows.iter().any(ScanRow::is_dual)
    }
}
