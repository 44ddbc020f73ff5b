//! Mock infrastructure for chainscan integration tests.
//!
//! - `RpcMockBuilder`: wraps mockito with Ethereum JSON-RPC responses
//! - `test_helpers`: in-process fakes for the probe, RPC source and fetcher seams
//!
//! ```ignore
//! use tests::mock_infrastructure::RpcMockBuilder;
//!
//! let mut mock = RpcMockBuilder::new().await;
//! mock.mock_block_number(100).mock_gas_price(25_000_000_000);
//! // point an RpcClient at mock.url()
//! ```

pub mod rpc_mock;
pub mod test_helpers;

pub use rpc_mock::RpcMockBuilder;
pub use test_helpers::*;
