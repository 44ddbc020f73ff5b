//! Registry of known chains and their RPC endpoints.
//!
//! Each logical chain (keyed by a short slug such as `ethereum`) may carry a mainnet and a
//! testnet network. RPC lists merge user-configured URLs ahead of the built-in ones, so a
//! custom endpoint always has priority in failover order.

use std::{collections::HashMap, sync::Arc};

use crate::types::{ChainKey, Endpoint, ModeFilter, NetworkMode, ScanTarget};

/// Source of candidate endpoints for a chain+mode.
///
/// Implemented by [`ChainRegistry`]; tests substitute fixed lists.
pub trait RpcSource: Send + Sync {
    /// Returns the ordered candidate list, highest priority first.
    fn rpcs(&self, chain: &str, mode: NetworkMode) -> Vec<Endpoint>;
}

/// One network (mainnet or testnet) of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub name: String,
    pub currency: String,
    pub explorer_url: String,
    pub rpcs: Vec<Endpoint>,
}

impl NetworkInfo {
    /// Block-explorer page for an address on this network.
    #[must_use]
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{address}", self.explorer_url.trim_end_matches('/'))
    }
}

/// A logical chain with optional mainnet and testnet networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    pub key: ChainKey,
    pub name: String,
    pub mainnet: Option<NetworkInfo>,
    pub testnet: Option<NetworkInfo>,
}

impl ChainInfo {
    #[must_use]
    pub fn network(&self, mode: NetworkMode) -> Option<&NetworkInfo> {
        match mode {
            NetworkMode::Mainnet => self.mainnet.as_ref(),
            NetworkMode::Testnet => self.testnet.as_ref(),
        }
    }

    /// Returns `true` if the chain has at least one of the filter's networks.
    #[must_use]
    pub fn supports(&self, filter: ModeFilter) -> bool {
        filter.modes().iter().any(|mode| self.network(*mode).is_some())
    }

    /// Currency symbol of the first network present, mainnet preferred.
    #[must_use]
    pub fn currency(&self) -> &str {
        self.mainnet
            .as_ref()
            .or(self.testnet.as_ref())
            .map_or("", |network| network.currency.as_str())
    }
}

struct BuiltinNetwork {
    chain_id: u64,
    name: &'static str,
    currency: &'static str,
    explorer: &'static str,
    rpcs: &'static [&'static str],
}

struct BuiltinChain {
    key: &'static str,
    name: &'static str,
    mainnet: BuiltinNetwork,
    testnet: BuiltinNetwork,
}

const BUILTIN_CHAINS: &[BuiltinChain] = &[
    BuiltinChain {
        key: "ethereum",
        name: "Ethereum",
        mainnet: BuiltinNetwork {
            chain_id: 1,
            name: "Ethereum Mainnet",
            currency: "ETH",
            explorer: "https://etherscan.io",
            rpcs: &[
                "https://eth.llamarpc.com",
                "https://ethereum-rpc.publicnode.com",
                "https://rpc.ankr.com/eth",
                "https://cloudflare-eth.com",
            ],
        },
        testnet: BuiltinNetwork {
            chain_id: 11_155_111,
            name: "Sepolia",
            currency: "ETH",
            explorer: "https://sepolia.etherscan.io",
            rpcs: &[
                "https://ethereum-sepolia-rpc.publicnode.com",
                "https://rpc.sepolia.org",
                "https://rpc2.sepolia.org",
            ],
        },
    },
    BuiltinChain {
        key: "polygon",
        name: "Polygon",
        mainnet: BuiltinNetwork {
            chain_id: 137,
            name: "Polygon PoS",
            currency: "POL",
            explorer: "https://polygonscan.com",
            rpcs: &[
                "https://polygon-rpc.com",
                "https://polygon-bor-rpc.publicnode.com",
                "https://rpc.ankr.com/polygon",
            ],
        },
        testnet: BuiltinNetwork {
            chain_id: 80_002,
            name: "Polygon Amoy",
            currency: "POL",
            explorer: "https://amoy.polygonscan.com",
            rpcs: &[
                "https://rpc-amoy.polygon.technology",
                "https://polygon-amoy-bor-rpc.publicnode.com",
            ],
        },
    },
    BuiltinChain {
        key: "bsc",
        name: "BNB Smart Chain",
        mainnet: BuiltinNetwork {
            chain_id: 56,
            name: "BNB Smart Chain",
            currency: "BNB",
            explorer: "https://bscscan.com",
            rpcs: &[
                "https://bsc-dataseed.bnbchain.org",
                "https://bsc-rpc.publicnode.com",
                "https://rpc.ankr.com/bsc",
            ],
        },
        testnet: BuiltinNetwork {
            chain_id: 97,
            name: "BNB Smart Chain Testnet",
            currency: "tBNB",
            explorer: "https://testnet.bscscan.com",
            rpcs: &[
                "https://data-seed-prebsc-1-s1.bnbchain.org:8545",
                "https://bsc-testnet-rpc.publicnode.com",
            ],
        },
    },
    BuiltinChain {
        key: "arbitrum",
        name: "Arbitrum One",
        mainnet: BuiltinNetwork {
            chain_id: 42_161,
            name: "Arbitrum One",
            currency: "ETH",
            explorer: "https://arbiscan.io",
            rpcs: &["https://arb1.arbitrum.io/rpc", "https://arbitrum-one-rpc.publicnode.com"],
        },
        testnet: BuiltinNetwork {
            chain_id: 421_614,
            name: "Arbitrum Sepolia",
            currency: "ETH",
            explorer: "https://sepolia.arbiscan.io",
            rpcs: &[
                "https://sepolia-rollup.arbitrum.io/rpc",
                "https://arbitrum-sepolia-rpc.publicnode.com",
            ],
        },
    },
    BuiltinChain {
        key: "optimism",
        name: "OP Mainnet",
        mainnet: BuiltinNetwork {
            chain_id: 10,
            name: "OP Mainnet",
            currency: "ETH",
            explorer: "https://optimistic.etherscan.io",
            rpcs: &["https://mainnet.optimism.io", "https://optimism-rpc.publicnode.com"],
        },
        testnet: BuiltinNetwork {
            chain_id: 11_155_420,
            name: "OP Sepolia",
            currency: "ETH",
            explorer: "https://sepolia-optimism.etherscan.io",
            rpcs: &["https://sepolia.optimism.io", "https://optimism-sepolia-rpc.publicnode.com"],
        },
    },
    BuiltinChain {
        key: "base",
        name: "Base",
        mainnet: BuiltinNetwork {
            chain_id: 8453,
            name: "Base",
            currency: "ETH",
            explorer: "https://basescan.org",
            rpcs: &["https://mainnet.base.org", "https://base-rpc.publicnode.com"],
        },
        testnet: BuiltinNetwork {
            chain_id: 84_532,
            name: "Base Sepolia",
            currency: "ETH",
            explorer: "https://sepolia.basescan.org",
            rpcs: &["https://sepolia.base.org", "https://base-sepolia-rpc.publicnode.com"],
        },
    },
    BuiltinChain {
        key: "avalanche",
        name: "Avalanche C-Chain",
        mainnet: BuiltinNetwork {
            chain_id: 43_114,
            name: "Avalanche C-Chain",
            currency: "AVAX",
            explorer: "https://snowtrace.io",
            rpcs: &[
                "https://api.avax.network/ext/bc/C/rpc",
                "https://avalanche-c-chain-rpc.publicnode.com",
            ],
        },
        testnet: BuiltinNetwork {
            chain_id: 43_113,
            name: "Avalanche Fuji",
            currency: "AVAX",
            explorer: "https://testnet.snowtrace.io",
            rpcs: &[
                "https://api.avax-test.network/ext/bc/C/rpc",
                "https://avalanche-fuji-c-chain-rpc.publicnode.com",
            ],
        },
    },
    BuiltinChain {
        key: "gnosis",
        name: "Gnosis",
        mainnet: BuiltinNetwork {
            chain_id: 100,
            name: "Gnosis",
            currency: "xDAI",
            explorer: "https://gnosisscan.io",
            rpcs: &["https://rpc.gnosischain.com", "https://gnosis-rpc.publicnode.com"],
        },
        testnet: BuiltinNetwork {
            chain_id: 10_200,
            name: "Gnosis Chiado",
            currency: "xDAI",
            explorer: "https://gnosis-chiado.blockscout.com",
            rpcs: &["https://rpc.chiadochain.net", "https://gnosis-chiado-rpc.publicnode.com"],
        },
    },
];

impl From<&BuiltinNetwork> for NetworkInfo {
    fn from(network: &BuiltinNetwork) -> Self {
        Self {
            chain_id: network.chain_id,
            name: network.name.to_string(),
            currency: network.currency.to_string(),
            explorer_url: network.explorer.to_string(),
            rpcs: network.rpcs.iter().map(|url| (*url).to_string()).collect(),
        }
    }
}

/// Known chains plus user-configured RPC overrides.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: Vec<ChainInfo>,
    custom: HashMap<(ChainKey, NetworkMode), Vec<Endpoint>>,
}

impl ChainRegistry {
    /// Creates an empty registry. Mostly useful in tests together with [`Self::add_chain`].
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry populated with the built-in chain table.
    #[must_use]
    pub fn builtin() -> Self {
        let chains = BUILTIN_CHAINS
            .iter()
            .map(|chain| ChainInfo {
                key: Arc::from(chain.key),
                name: chain.name.to_string(),
                mainnet: Some(NetworkInfo::from(&chain.mainnet)),
                testnet: Some(NetworkInfo::from(&chain.testnet)),
            })
            .collect();

        Self { chains, custom: HashMap::new() }
    }

    /// Adds or replaces a chain definition.
    pub fn add_chain(&mut self, chain: ChainInfo) {
        if let Some(existing) = self.chains.iter_mut().find(|c| c.key == chain.key) {
            *existing = chain;
        } else {
            self.chains.push(chain);
        }
    }

    /// Registers custom RPC URLs for a chain+mode; they take priority over built-ins.
    ///
    /// Repeated calls for the same chain+mode append in call order.
    ///
    /// # Errors
    ///
    /// Returns an error string if the chain is unknown or has no network for `mode`.
    pub fn add_custom_rpcs(
        &mut self,
        chain: &str,
        mode: NetworkMode,
        urls: impl IntoIterator<Item = Endpoint>,
    ) -> Result<(), String> {
        let info = self.resolve(chain).ok_or_else(|| format!("unknown chain '{chain}'"))?;
        if info.network(mode).is_none() {
            return Err(format!("chain '{chain}' has no {mode} network"));
        }
        let key = Arc::clone(&info.key);
        self.custom.entry((key, mode)).or_default().extend(urls);
        Ok(())
    }

    /// All chains in registry order.
    #[must_use]
    pub fn all(&self) -> &[ChainInfo] {
        &self.chains
    }

    /// Looks up a chain by key, display name (case-insensitive) or numeric chain id.
    #[must_use]
    pub fn resolve(&self, query: &str) -> Option<&ChainInfo> {
        let query = query.trim();
        if let Ok(chain_id) = query.parse::<u64>() {
            return self.chains.iter().find(|chain| {
                [NetworkMode::Mainnet, NetworkMode::Testnet]
                    .iter()
                    .any(|mode| chain.network(*mode).is_some_and(|n| n.chain_id == chain_id))
            });
        }

        self.chains.iter().find(|chain| {
            chain.key.as_ref().eq_ignore_ascii_case(query) || chain.name.eq_ignore_ascii_case(query)
        })
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ChainInfo> {
        self.chains.iter().find(|chain| chain.key.as_ref() == key)
    }

    #[must_use]
    pub fn network(&self, key: &str, mode: NetworkMode) -> Option<&NetworkInfo> {
        self.get(key).and_then(|chain| chain.network(mode))
    }

    /// Chains covering the filter, in registry order.
    ///
    /// An empty `names` list selects every chain; otherwise only chains matching one of the
    /// names (via [`Self::resolve`]) are returned, still in registry order.
    #[must_use]
    pub fn chains(&self, filter: ModeFilter, names: &[String]) -> Vec<&ChainInfo> {
        let wanted: Vec<&ChainKey> =
            names.iter().filter_map(|name| self.resolve(name)).map(|chain| &chain.key).collect();

        self.chains
            .iter()
            .filter(|chain| chain.supports(filter))
            .filter(|chain| names.is_empty() || wanted.contains(&&chain.key))
            .collect()
    }

    /// Expands chains into scan targets, one per network present in the filter.
    #[must_use]
    pub fn targets(&self, filter: ModeFilter, names: &[String]) -> Vec<ScanTarget> {
        self.chains(filter, names)
            .into_iter()
            .flat_map(|chain| {
                filter
                    .modes()
                    .iter()
                    .filter(|mode| chain.network(**mode).is_some())
                    .map(|mode| ScanTarget { chain: Arc::clone(&chain.key), mode: *mode })
            })
            .collect()
    }
}

impl RpcSource for ChainRegistry {
    fn rpcs(&self, chain: &str, mode: NetworkMode) -> Vec<Endpoint> {
        let custom = self
            .get(chain)
            .and_then(|info| self.custom.get(&(Arc::clone(&info.key), mode)))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let builtin = self.network(chain, mode).map(|n| n.rpcs.as_slice()).unwrap_or_default();

        let mut merged: Vec<Endpoint> = Vec::with_capacity(custom.len() + builtin.len());
        for url in custom.iter().chain(builtin) {
            if !merged.contains(url) {
                merged.push(url.clone());
            }
        }
        merged
    }
}
