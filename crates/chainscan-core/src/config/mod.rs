//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: `Default` implementations and serde defaults
//! 2. **Config file**: TOML file named by the `CHAINSCAN_CONFIG` env var (default
//!    `config/chainscan.toml`); a missing file is not an error
//! 3. **Environment variables**: `CHAINSCAN__*` env vars override specific fields
//!
//! # Example
//!
//! ```toml
//! [selection]
//! algorithm = "failover"
//!
//! [timeouts]
//! target_timeout_ms = 8000
//!
//! [[rpcs]]
//! chain = "ethereum"
//! mode = "mainnet"
//! urls = ["https://my-node.example.com"]
//!
//! [prices]
//! ETH = 3200.0
//! ```

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, time::Duration};

use crate::{
    registry::ChainRegistry,
    types::{ModeFilter, NetworkMode},
    upstream::{RpcClientConfig, SelectionAlgorithm, SelectorConfig},
};

pub use config::ConfigError;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/chainscan.toml";

/// Endpoint selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Algorithm used when a command does not override it. Defaults to `fastest`.
    #[serde(default)]
    pub algorithm: SelectionAlgorithm,

    /// Seconds a failed URL stays behind fresh candidates in failover. Defaults to `60`.
    #[serde(default = "default_failover_cooldown_seconds")]
    pub failover_cooldown_seconds: u64,
}

fn default_failover_cooldown_seconds() -> u64 {
    60
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            algorithm: SelectionAlgorithm::default(),
            failover_cooldown_seconds: default_failover_cooldown_seconds(),
        }
    }
}

/// Timeouts, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Bound on one scan target's selection plus fetch. Defaults to `8000`.
    #[serde(default = "default_target_timeout_ms")]
    pub target_timeout_ms: u64,

    /// Bound on a benchmark round. Defaults to `5000`.
    #[serde(default = "default_benchmark_timeout_ms")]
    pub benchmark_timeout_ms: u64,

    /// Bound on one failover liveness probe. Defaults to `2000`.
    #[serde(default = "default_failover_probe_timeout_ms")]
    pub failover_probe_timeout_ms: u64,

    /// Bound on a single HTTP request. Defaults to `10000`.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_target_timeout_ms() -> u64 {
    8000
}

fn default_benchmark_timeout_ms() -> u64 {
    5000
}

fn default_failover_probe_timeout_ms() -> u64 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            target_timeout_ms: default_target_timeout_ms(),
            benchmark_timeout_ms: default_benchmark_timeout_ms(),
            failover_probe_timeout_ms: default_failover_probe_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Scan view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Network mode scanned when a command does not override it. Defaults to `mainnet`.
    #[serde(default)]
    pub mode: ModeFilter,

    /// Maximum characters of a row's error message. Defaults to `48`.
    #[serde(default = "default_error_max_len")]
    pub error_max_len: usize,
}

fn default_error_max_len() -> usize {
    48
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { mode: ModeFilter::default(), error_max_len: default_error_max_len() }
    }
}

/// User-supplied RPC URLs for one chain and network mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomRpcConfig {
    /// Chain key, display name or chain id (e.g. `ethereum`, `137`).
    pub chain: String,

    #[serde(default = "default_custom_mode")]
    pub mode: NetworkMode,

    pub urls: Vec<String>,
}

fn default_custom_mode() -> NetworkMode {
    NetworkMode::Mainnet
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for workspace crates. Defaults to `"warn"`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    /// Custom RPC lists, merged ahead of the built-in ones.
    #[serde(default)]
    pub rpcs: Vec<CustomRpcConfig>,

    /// Currency symbol to USD price, used for the balance scan's converted value.
    #[serde(default)]
    pub prices: BTreeMap<String, f64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Environment variables with the `CHAINSCAN__` prefix override any value, using `__` as
    /// the separator for nested fields (e.g. `CHAINSCAN__SELECTION__ALGORITHM=failover`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("selection.algorithm", "fastest")?
            .set_default("timeouts.target_timeout_ms", default_target_timeout_ms())?
            .set_default("timeouts.benchmark_timeout_ms", default_benchmark_timeout_ms())?
            .set_default("scan.mode", "mainnet")?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("CHAINSCAN").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `CHAINSCAN_CONFIG` or [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file(Self::config_path())
    }

    /// The config file path `load` reads from.
    #[must_use]
    pub fn config_path() -> String {
        std::env::var("CHAINSCAN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        let timeouts = [
            ("target_timeout_ms", self.timeouts.target_timeout_ms),
            ("benchmark_timeout_ms", self.timeouts.benchmark_timeout_ms),
            ("failover_probe_timeout_ms", self.timeouts.failover_probe_timeout_ms),
            ("request_timeout_ms", self.timeouts.request_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(format!("Timeout {name} must be greater than 0"));
            }
        }

        let registry = ChainRegistry::builtin();
        for custom in &self.rpcs {
            let chain = registry
                .resolve(&custom.chain)
                .ok_or_else(|| format!("Unknown chain in [[rpcs]]: {}", custom.chain))?;
            if chain.network(custom.mode).is_none() {
                return Err(format!("Chain {} has no {} network", custom.chain, custom.mode));
            }
            for url in &custom.urls {
                validate_http_url(url).map_err(|e| {
                    format!("Invalid RPC URL for {} {}: {e}", custom.chain, custom.mode)
                })?;
            }
        }

        for (currency, price) in &self.prices {
            if !price.is_finite() || *price < 0.0 {
                return Err(format!("Price for {currency} must be a non-negative number"));
            }
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }

    /// Builds the chain registry with custom RPCs merged in.
    ///
    /// # Errors
    ///
    /// Returns an error string if a custom entry names an unknown chain or network.
    pub fn build_registry(&self) -> Result<ChainRegistry, String> {
        let mut registry = ChainRegistry::builtin();
        for custom in &self.rpcs {
            registry.add_custom_rpcs(&custom.chain, custom.mode, custom.urls.iter().cloned())?;
        }
        Ok(registry)
    }

    /// USD price for a currency symbol, matched case-insensitively.
    #[must_use]
    pub fn price_for(&self, currency: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|(symbol, _)| symbol.eq_ignore_ascii_case(currency))
            .map(|(_, price)| *price)
    }

    #[must_use]
    pub fn target_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.target_timeout_ms)
    }

    #[must_use]
    pub fn benchmark_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.benchmark_timeout_ms)
    }

    #[must_use]
    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            failover_probe_timeout: Duration::from_millis(self.timeouts.failover_probe_timeout_ms),
            failover_cooldown: Duration::from_secs(self.selection.failover_cooldown_seconds),
        }
    }

    #[must_use]
    pub fn rpc_client_config(&self) -> RpcClientConfig {
        let request_timeout = Duration::from_millis(self.timeouts.request_timeout_ms);
        RpcClientConfig {
            request_timeout,
            connect_timeout: request_timeout.min(RpcClientConfig::default().connect_timeout),
            ..RpcClientConfig::default()
        }
    }
}

fn validate_http_url(raw: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("{raw}: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{raw}: unsupported scheme '{other}'")),
    }
}
