//! mockito-backed JSON-RPC endpoint.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};

/// Mock Ethereum RPC endpoint. Every helper matches on the JSON-RPC method name.
pub struct RpcMockBuilder {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

fn method_matcher(method: &str) -> Matcher {
    Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#))
}

impl RpcMockBuilder {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await, mocks: Vec::new() }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn mock_result(&mut self, method: &str, result: Value) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(method_matcher(method))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks `eth_blockNumber`.
    pub fn mock_block_number(&mut self, block_number: u64) -> &mut Self {
        self.mock_result("eth_blockNumber", json!(format!("0x{block_number:x}")))
    }

    /// Mocks `eth_getBalance` for any address.
    pub fn mock_get_balance(&mut self, wei: u128) -> &mut Self {
        self.mock_result("eth_getBalance", json!(format!("0x{wei:x}")))
    }

    /// Mocks `eth_gasPrice`.
    pub fn mock_gas_price(&mut self, wei: u128) -> &mut Self {
        self.mock_result("eth_gasPrice", json!(format!("0x{wei:x}")))
    }

    /// Mocks a raw result value, for malformed-response cases.
    pub fn mock_raw_result(&mut self, method: &str, result: Value) -> &mut Self {
        self.mock_result(method, result)
    }

    /// Mocks a JSON-RPC error object for `method`.
    pub fn mock_rpc_error(&mut self, method: &str, code: i64, message: &str) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .match_body(method_matcher(method))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": { "code": code, "message": message }
                })
                .to_string(),
            )
            .create();

        self.mocks.push(mock);
        self
    }

    /// Mocks an HTTP status for every request.
    pub fn mock_server_error(&mut self, status: usize) -> &mut Self {
        let mock = self
            .server
            .mock("POST", "/")
            .with_status(status)
            .with_body("upstream unavailable")
            .create();

        self.mocks.push(mock);
        self
    }

    /// Asserts every registered mock was hit.
    pub fn assert_all(&self) {
        for mock in &self.mocks {
            mock.assert();
        }
    }
}
