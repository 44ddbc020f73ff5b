use std::time::Duration;
use thiserror::Error;

/// Errors produced while selecting an endpoint or fetching data for one scan target.
///
/// Every variant is recorded on the affected row only; none of them abort a scan.
/// The type is `Clone` so the same value can be stored in a row, logged, and carried
/// inside [`ScanError::SelectionExhausted`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanError {
    /// No RPC endpoints are configured for the requested chain and network mode.
    #[error("Config error: {0}")]
    Config(String),

    /// Dial failure, refused or reset connection.
    #[error("Network error: {0}")]
    Network(String),

    /// The operation exceeded its deadline.
    #[error("Timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Non-2xx HTTP status from the endpoint.
    ///
    /// First field is the HTTP status code, second is the response reason.
    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    /// JSON-RPC error object returned by the endpoint.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Malformed or unexpected response body.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Every candidate endpoint failed. Carries the last underlying error so the
    /// row shows the real cause instead of a generic message.
    #[error("all {attempts} endpoints failed: {last}")]
    SelectionExhausted { attempts: usize, last: Box<ScanError> },
}

impl ScanError {
    /// Shorthand for the configuration error raised when a chain+mode has no endpoints.
    #[must_use]
    pub fn no_endpoints(chain: &str, mode: impl std::fmt::Display) -> Self {
        Self::Config(format!("no RPC endpoints configured for {chain} {mode}"))
    }

    /// Returns `true` if re-dispatching the target may succeed.
    ///
    /// Configuration errors and client-side RPC errors are not retryable; everything
    /// network-shaped is. Exhausted selections inherit from their last cause.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Network(_) | Self::Timeout(_) | Self::Protocol(_) => true,
            Self::Http(status, _) => (500..=599).contains(status) || *status == 429,
            // -32600..=-32602 are request/params errors, the endpoint is not at fault
            Self::Rpc { code, .. } => !(-32602..=-32600).contains(code),
            Self::SelectionExhausted { last, .. } => last.is_retryable(),
        }
    }

    /// Returns the innermost error, unwrapping exhausted selections.
    #[must_use]
    pub fn last_cause(&self) -> &ScanError {
        match self {
            Self::SelectionExhausted { last, .. } => last.last_cause(),
            other => other,
        }
    }

    /// Returns a static label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Http(..) => "http",
            Self::Rpc { .. } => "rpc",
            Self::Protocol(_) => "protocol",
            Self::SelectionExhausted { .. } => "selection_exhausted",
        }
    }
}
