use std::{fmt, sync::LazyLock};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{NetworkId, ProviderError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Network {
    pub name: String,
    pub chain_id: NetworkId,
}

impl Network {
    pub fn new(name: impl Into<String>, chain_id: NetworkId) -> Self {
        Self { name: name.into(), chain_id }
    }

    /// Resolves a name, alias or chain id against the process-wide registry.
    ///
    /// Unknown names are an error. Unknown chain ids are not: they resolve to a
    /// network named `unknown` so callers can still talk to custom chains.
    pub fn resolve(networkish: impl Into<Networkish>) -> Result<Network> {
        match networkish.into() {
            Networkish::Network(network) => Ok(network),
            Networkish::ChainId(chain_id) => Ok(find_network_by_chain_id(chain_id)
                .unwrap_or_else(|| Network::new("unknown", chain_id))),
            Networkish::Name(name) => {
                find_network_by_name(&name).ok_or(ProviderError::UnknownNetwork { network: name })
            }
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Networkish {
    Name(String),
    ChainId(NetworkId),
    Network(Network),
}

impl Default for Networkish {
    fn default() -> Self {
        Networkish::Name("mainnet".to_string())
    }
}

impl From<&str> for Networkish {
    fn from(name: &str) -> Self {
        Networkish::Name(name.to_string())
    }
}

impl From<String> for Networkish {
    fn from(name: String) -> Self {
        Networkish::Name(name)
    }
}

impl From<NetworkId> for Networkish {
    fn from(chain_id: NetworkId) -> Self {
        Networkish::ChainId(chain_id)
    }
}

impl From<Network> for Networkish {
    fn from(network: Network) -> Self {
        Networkish::Network(network)
    }
}

impl From<&Network> for Networkish {
    fn from(network: &Network) -> Self {
        Networkish::Network(network.clone())
    }
}

#[derive(Debug, Clone)]
struct NetworkEntry {
    network: Network,
    aliases: Vec<String>,
}

impl NetworkEntry {
    fn matches(&self, name: &str) -> bool {
        self.network.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

const BUILTIN_NETWORKS: &[(&str, NetworkId, &[&str])] = &[
    ("mainnet", 1, &["homestead", "ethereum"]),
    ("sepolia", 11155111, &[]),
    ("eth-holesky", 17000, &["holesky"]),
    ("gnosis", 100, &["xdai"]),
    ("gnosis-chiado", 10200, &[]),
    ("arbitrum", 42161, &[]),
    ("arbitrum-nova", 42170, &[]),
    ("arbitrum-sepolia", 421614, &[]),
    ("base", 8453, &[]),
    ("base-sepolia", 84532, &[]),
    ("matic", 137, &["polygon"]),
    ("matic-zkevm", 1101, &[]),
    ("optimism", 10, &[]),
    ("optimism-sepolia", 11155420, &[]),
    ("zksync", 324, &[]),
    ("zksync-sepolia", 300, &[]),
    ("bnb", 56, &["bsc"]),
    ("avalanche", 43114, &[]),
    ("linea", 59144, &[]),
];

static REGISTRY: LazyLock<RwLock<Vec<NetworkEntry>>> = LazyLock::new(|| {
    RwLock::new(
        BUILTIN_NETWORKS
            .iter()
            .map(|(name, chain_id, aliases)| NetworkEntry {
                network: Network::new(*name, *chain_id),
                aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
            })
            .collect(),
    )
});

/// Adds (or replaces) a network in the process-wide registry.
pub fn register_network(name: &str, chain_id: NetworkId) -> Result<Network> {
    if name.trim().is_empty() {
        return Err(ProviderError::InvalidArgument {
            argument: "name",
            value: name.to_string(),
            message: "network name must not be empty",
        });
    }

    let network = Network::new(name.to_lowercase(), chain_id);
    let mut registry = REGISTRY.write();
    registry.retain(|entry| !entry.matches(name) && entry.network.chain_id != chain_id);
    registry.push(NetworkEntry { network: network.clone(), aliases: vec![] });

    tracing::debug!(network = %network, "Registered network");
    Ok(network)
}

pub fn registered_networks() -> Vec<Network> {
    REGISTRY.read().iter().map(|entry| entry.network.clone()).collect()
}

pub fn find_network_by_chain_id(chain_id: NetworkId) -> Option<Network> {
    REGISTRY
        .read()
        .iter()
        .find(|entry| entry.network.chain_id == chain_id)
        .map(|entry| entry.network.clone())
}

pub fn find_network_by_name(name: &str) -> Option<Network> {
    REGISTRY
        .read()
        .iter()
        .find(|entry| entry.matches(name))
        .map(|entry| entry.network.clone())
}
