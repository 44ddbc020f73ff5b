use chainscan_core::{
    config::AppConfig,
    registry::ChainRegistry,
    scan::{OrchestratorConfig, ScanOrchestrator},
    upstream::{Benchmarker, EndpointSelector, RpcClient, SelectionAlgorithm},
};
use std::sync::Arc;

use super::utils::{CliError, CliResult};

/// Shared services every network command builds from the loaded configuration.
pub struct AppContext {
    pub config: AppConfig,
    pub registry: Arc<ChainRegistry>,
    pub client: Arc<RpcClient>,
    pub selector: Arc<EndpointSelector>,
}

impl AppContext {
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if custom RPCs reference unknown chains or the HTTP client
    /// cannot be built.
    pub fn new(config: AppConfig) -> CliResult<Self> {
        let registry = Arc::new(config.build_registry().map_err(CliError::Config)?);
        let client = Arc::new(RpcClient::with_config(config.rpc_client_config())?);
        let benchmarker = Benchmarker::new(client.clone());
        let selector =
            Arc::new(EndpointSelector::with_config(benchmarker, config.selector_config()));

        Ok(Self { config, registry, client, selector })
    }

    /// Orchestrator for one scan, using `algorithm` or the configured default.
    pub fn orchestrator(&self, algorithm: Option<SelectionAlgorithm>) -> ScanOrchestrator {
        ScanOrchestrator::new(
            Arc::clone(&self.selector),
            self.registry.clone(),
            OrchestratorConfig {
                algorithm: algorithm.unwrap_or(self.config.selection.algorithm),
                target_timeout: self.config.target_timeout(),
                selection_timeout: self.config.benchmark_timeout(),
            },
        )
    }

    pub fn benchmarker(&self) -> &Benchmarker {
        self.selector.benchmarker()
    }
}
