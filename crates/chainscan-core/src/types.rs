//! Shared value types for scan targets and network modes.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

/// One RPC URL scoped to a chain and network mode.
pub type Endpoint = String;

/// Logical chain identifier (registry key such as `ethereum` or `polygon`).
///
/// Mainnet and testnet networks of the same chain share one key, which is what lets a
/// dual-mode scan group both sub-results under a single display row.
pub type ChainKey = Arc<str>;

/// Which network of a chain a target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Mainnet,
    Testnet,
}

impl NetworkMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            other => Err(format!("unknown network mode '{other}' (expected mainnet or testnet)")),
        }
    }
}

/// The set of network modes a command scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeFilter {
    #[default]
    Mainnet,
    Testnet,
    Both,
}

impl ModeFilter {
    /// Returns the concrete modes covered by this filter, mainnet first.
    #[must_use]
    pub fn modes(&self) -> &'static [NetworkMode] {
        match self {
            Self::Mainnet => &[NetworkMode::Mainnet],
            Self::Testnet => &[NetworkMode::Testnet],
            Self::Both => &[NetworkMode::Mainnet, NetworkMode::Testnet],
        }
    }

    #[must_use]
    pub fn is_dual(&self) -> bool {
        matches!(self, Self::Both)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for ModeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "both" | "all" => Ok(Self::Both),
            other => other.parse::<NetworkMode>().map(Self::from).map_err(|_| {
                format!("unknown network mode '{other}' (expected mainnet, testnet or both)")
            }),
        }
    }
}

impl From<NetworkMode> for ModeFilter {
    fn from(mode: NetworkMode) -> Self {
        match mode {
            NetworkMode::Mainnet => Self::Mainnet,
            NetworkMode::Testnet => Self::Testnet,
        }
    }
}

/// One unit of fan-out work: a chain in a specific network mode.
///
/// Plain data, so a retry re-submits the same descriptor instead of relying on captured
/// closure state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    pub chain: ChainKey,
    pub mode: NetworkMode,
}

impl ScanTarget {
    #[must_use]
    pub fn new(chain: impl Into<ChainKey>, mode: NetworkMode) -> Self {
        Self { chain: chain.into(), mode }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.mode)
    }
}
