//! Domain fetch functions for scan commands.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

use crate::{
    types::ScanTarget,
    upstream::{RpcClient, ScanError},
    utils::{format_ether, format_gwei, wei_to_ether_f64},
};

/// Fetches one target's payload from an already-selected endpoint.
///
/// The orchestrator is generic over `P` and never looks inside it.
#[async_trait]
pub trait ScanFetcher<P>: Send + Sync {
    async fn fetch(&self, target: &ScanTarget, endpoint: &str) -> Result<P, ScanError>;
}

/// Native balance of an address, with an optional USD conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalancePayload {
    pub wei: u128,
    pub usd: Option<f64>,
}

impl BalancePayload {
    /// Balance in whole native units with up to 6 decimals.
    #[must_use]
    pub fn native(&self) -> String {
        format_ether(self.wei, 6)
    }
}

/// Current gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPricePayload {
    pub wei: u128,
}

impl GasPricePayload {
    #[must_use]
    pub fn gwei(&self) -> String {
        format_gwei(self.wei, 3)
    }
}

/// Reads `eth_getBalance` for one address on every target.
pub struct BalanceFetcher {
    client: Arc<RpcClient>,
    address: String,
    prices: HashMap<ScanTarget, f64>,
}

impl BalanceFetcher {
    #[must_use]
    pub fn new(client: Arc<RpcClient>, address: impl Into<String>) -> Self {
        Self { client, address: address.into(), prices: HashMap::new() }
    }

    /// USD price per whole native unit, keyed by target. Targets without an entry get no
    /// converted value.
    #[must_use]
    pub fn with_prices(mut self, prices: HashMap<ScanTarget, f64>) -> Self {
        self.prices = prices;
        self
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl ScanFetcher<BalancePayload> for BalanceFetcher {
    async fn fetch(
        &self,
        target: &ScanTarget,
        endpoint: &str,
    ) -> Result<BalancePayload, ScanError> {
        let wei = self.client.get_balance(endpoint, &self.address).await?;
        let usd = self.prices.get(target).map(|price| wei_to_ether_f64(wei) * price);
        Ok(BalancePayload { wei, usd })
    }
}

/// Reads `eth_gasPrice` on every target.
pub struct GasPriceFetcher {
    client: Arc<RpcClient>,
}

impl GasPriceFetcher {
    #[must_use]
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScanFetcher<GasPricePayload> for GasPriceFetcher {
    async fn fetch(
        &self,
        _target: &ScanTarget,
        endpoint: &str,
    ) -> Result<GasPricePayload, ScanError> {
        let wei = self.client.gas_price(endpoint).await?;
        Ok(GasPricePayload { wei })
    }
}

/// Checks that `address` is `0x` followed by 40 hex digits and returns it lowercased.
///
/// # Errors
///
/// Returns a descriptive message for any other shape.
pub fn validate_address(address: &str) -> Result<String, String> {
    let trimmed = address.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| format!("address must start with 0x: {trimmed}"))?;

    if hex.len() != 40 {
        return Err(format!("address must have 40 hex digits, got {}", hex.len()));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("address contains non-hex characters: {trimmed}"));
    }

    Ok(format!("0x{}", hex.to_ascii_lowercase()))
}
