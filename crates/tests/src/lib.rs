//! Integration tests for chainscan.
//!
//! - `rpc_client_tests`: `RpcClient` and `Benchmarker` against mockito endpoints
//! - `selector_tests`: endpoint selection over real HTTP and scripted probes
//! - `scan_flow_tests`: full scan sessions (fan-out, timeouts, retry, dual mode)
//! - `config_tests`: layered config loading with environment overrides
//! - `mock_infrastructure`: reusable mocks and fakes
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod rpc_client_tests;

#[cfg(test)]
mod selector_tests;

#[cfg(test)]
mod scan_flow_tests;

#[cfg(test)]
mod config_tests;

/// Mock infrastructure for testing
pub mod mock_infrastructure;
