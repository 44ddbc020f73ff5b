use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use crate::{
    upstream::{benchmark::LivenessProbe, errors::ScanError},
    utils::{parse_quantity_u128, parse_quantity_u64},
};

/// Configuration for the JSON-RPC HTTP client.
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Upper bound for one HTTP round trip, connect included
    pub request_timeout: Duration,
    /// Upper bound for establishing the TCP/TLS connection
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: concat!("chainscan/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Minimal JSON-RPC 2.0 client over HTTP POST.
///
/// Transport failures are sanitised into [`ScanError`] at this boundary, so nothing above it
/// ever holds a raw `reqwest::Error`.
pub struct RpcClient {
    client: Client,
    config: RpcClientConfig,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, ScanError> {
        Self::with_config(RpcClientConfig::default())
    }

    /// Creates a client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: RpcClientConfig) -> Result<Self, ScanError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                ScanError::Config(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self { client, config, next_id: AtomicU64::new(1) })
    }

    #[must_use]
    pub fn config(&self) -> &RpcClientConfig {
        &self.config
    }

    /// Maps reqwest failures to short messages without URLs or addresses.
    fn sanitize_network_error(error: &reqwest::Error) -> String {
        if error.is_connect() {
            "connection refused or unreachable".to_string()
        } else if error.is_request() {
            "request failed".to_string()
        } else if error.is_body() {
            "response body error".to_string()
        } else if error.is_decode() {
            "response decode error".to_string()
        } else if error.is_redirect() {
            "unexpected redirect".to_string()
        } else {
            "network error".to_string()
        }
    }

    fn map_send_error(&self, error: &reqwest::Error) -> ScanError {
        if error.is_timeout() {
            ScanError::Timeout(self.config.request_timeout)
        } else {
            ScanError::Network(Self::sanitize_network_error(error))
        }
    }

    /// Performs one JSON-RPC call and returns the `result` member.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Timeout`] if the request exceeds the configured timeout
    /// - [`ScanError::Network`] for connection-level failures
    /// - [`ScanError::Http`] for non-success HTTP status codes
    /// - [`ScanError::Rpc`] if the response carries a JSON-RPC error object
    /// - [`ScanError::Protocol`] for malformed response bodies
    pub async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value, ScanError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::trace!(url = %url, status = status.as_u16(), method, "rpc http error");
            return Err(ScanError::Http(
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status").to_string(),
            ));
        }

        let text = response.text().await.map_err(|e| self.map_send_error(&e))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|_| ScanError::Protocol("response is not valid JSON".to_string()))?;

        parse_response(value)
    }

    /// Latest block height (`eth_blockNumber`).
    ///
    /// # Errors
    ///
    /// See [`Self::call`]; a non-quantity result is a [`ScanError::Protocol`].
    pub async fn block_number(&self, url: &str) -> Result<u64, ScanError> {
        let result = self.call(url, "eth_blockNumber", json!([])).await?;
        let hex = expect_str(&result, "eth_blockNumber")?;
        parse_quantity_u64(hex).map_err(|e| ScanError::Protocol(format!("eth_blockNumber: {e}")))
    }

    /// Native balance in wei at the latest block (`eth_getBalance`).
    ///
    /// # Errors
    ///
    /// See [`Self::call`]; a non-quantity result is a [`ScanError::Protocol`].
    pub async fn get_balance(&self, url: &str, address: &str) -> Result<u128, ScanError> {
        let result = self.call(url, "eth_getBalance", json!([address, "latest"])).await?;
        let hex = expect_str(&result, "eth_getBalance")?;
        parse_quantity_u128(hex).map_err(|e| ScanError::Protocol(format!("eth_getBalance: {e}")))
    }

    /// Current gas price in wei (`eth_gasPrice`).
    ///
    /// # Errors
    ///
    /// See [`Self::call`]; a non-quantity result is a [`ScanError::Protocol`].
    pub async fn gas_price(&self, url: &str) -> Result<u128, ScanError> {
        let result = self.call(url, "eth_gasPrice", json!([])).await?;
        let hex = expect_str(&result, "eth_gasPrice")?;
        parse_quantity_u128(hex).map_err(|e| ScanError::Protocol(format!("eth_gasPrice: {e}")))
    }
}

#[async_trait]
impl LivenessProbe for RpcClient {
    async fn probe(&self, url: &str) -> Result<u64, ScanError> {
        self.block_number(url).await
    }
}

fn expect_str<'a>(value: &'a Value, method: &str) -> Result<&'a str, ScanError> {
    value
        .as_str()
        .ok_or_else(|| ScanError::Protocol(format!("{method}: expected hex string result")))
}

/// Extracts `result` from a JSON-RPC response envelope.
///
/// # Errors
///
/// Returns [`ScanError::Rpc`] for an `error` member and [`ScanError::Protocol`] when the
/// envelope has neither `result` nor a well-formed `error`.
pub fn parse_response(mut value: Value) -> Result<Value, ScanError> {
    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64);
        let message = error.get("message").and_then(Value::as_str);
        return match (code, message) {
            (Some(code), Some(message)) => {
                Err(ScanError::Rpc { code, message: message.to_string() })
            }
            (Some(code), None) => Err(ScanError::Rpc { code, message: String::new() }),
            _ => Err(ScanError::Protocol("malformed error object".to_string())),
        };
    }

    match value.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(ScanError::Protocol("response has no result".to_string())),
    }
}
