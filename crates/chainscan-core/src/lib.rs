//! # Chainscan Core
//!
//! Core library for the `chainscan` multi-chain CLI.
//!
//! This crate provides:
//!
//! - **[`upstream`]**: endpoint benchmarking, the three selection algorithms (fastest,
//!   round-robin, failover) and the JSON-RPC client.
//!
//! - **[`scan`]**: fan-out of independent per-target fetch tasks, the single-owner result
//!   aggregator with generation-tagged retry, row orderings and the session controller.
//!
//! - **[`registry`]**: built-in chains and their RPC endpoints, merged with custom URLs.
//!
//! - **[`config`]**: layered configuration (defaults, TOML file, environment).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       ScanSession                        │
//! │  ┌──────────────────┐  ┌────────────────────────────┐    │
//! │  │ ResultAggregator │◄─┤ mpsc ◄── ScanOrchestrator  │    │
//! │  └────────┬─────────┘  └──────────────┬─────────────┘    │
//! │           │                           │                  │
//! │  ┌────────▼─────────┐  ┌──────────────▼─────────────┐    │
//! │  │ PresentationSink │  │ EndpointSelector           │    │
//! │  └──────────────────┘  │  └─ Benchmarker            │    │
//! │                        │      └─ LivenessProbe      │    │
//! │                        │          (RpcClient)       │    │
//! │                        └────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod registry;
pub mod scan;
pub mod types;
pub mod upstream;
pub mod utils;
