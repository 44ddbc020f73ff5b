//! Concurrent multi-chain scans.
//!
//! # Data Flow
//!
//! ```text
//! ResultAggregator::start ──► Vec<Dispatch>
//!                                 │
//!                                 ▼
//!                      ScanOrchestrator::dispatch
//!                 ┌───────────┬───┴───────┬───────────┐
//!                 ▼           ▼           ▼           ▼
//!              task 1      task 2      task 3  ... task N     select endpoint + fetch,
//!                 │           │           │           │       one timeout per task
//!                 └───────────┴─────┬─────┴───────────┘
//!                                   ▼  mpsc (one ScanResult per task)
//!                           ScanSession::run ──► ResultAggregator::apply
//!                                   │
//!                                   ▼
//!                           PresentationSink::render
//! ```
//!
//! Retry re-enters at the top with only the failed sub-rows.

pub mod aggregator;
pub mod fetchers;
pub mod orchestrator;
pub mod ordering;
pub mod session;

pub use aggregator::{ApplyOutcome, CombinedStatus, ResultAggregator, RowStatus, ScanRow, SubRow};
pub use fetchers::{
    validate_address, BalanceFetcher, BalancePayload, GasPriceFetcher, GasPricePayload, ScanFetcher,
};
pub use orchestrator::{Dispatch, OrchestratorConfig, ScanOrchestrator, ScanResult};
pub use ordering::{sort_rows, BalanceOrdering, GasPriceOrdering, LatencyOrdering, RowOrdering};
pub use session::{PresentationSink, ScanCommand, ScanOutcome, ScanSession};
