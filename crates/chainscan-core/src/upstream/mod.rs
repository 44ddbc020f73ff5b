//! Endpoint probing, selection and the JSON-RPC client.
//!
//! This module handles everything that talks to a candidate RPC endpoint:
//! - [`Benchmarker`] probes candidates concurrently and measures latency
//! - [`EndpointSelector`] turns a candidate list into exactly one URL
//! - [`RpcClient`] performs the JSON-RPC calls and implements [`LivenessProbe`]
//!
//! # Selection Algorithms
//!
//! ```text
//! candidates ──► [exactly one?] ── Yes ──► return it (no probing)
//!                     │
//!                     No
//!                     │
//!     ┌───────────────┼────────────────┐
//!     ▼               ▼                ▼
//!  Fastest        RoundRobin        Failover
//!  benchmark all  cursor[chain]++   probe in priority order,
//!  pick min       no probing        failed URLs cool down
//!  latency                          behind fresh ones
//! ```
//!
//! Fastest and Failover report [`ScanError::SelectionExhausted`] carrying the last
//! underlying error when nothing answers.

pub mod benchmark;
pub mod errors;
pub mod http_client;
pub mod selector;

pub use benchmark::{sort_fastest_first, BenchmarkResult, Benchmarker, LivenessProbe};
pub use errors::ScanError;
pub use http_client::{RpcClient, RpcClientConfig};
pub use selector::{EndpointSelector, SelectionAlgorithm, SelectorConfig};
