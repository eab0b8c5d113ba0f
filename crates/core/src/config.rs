//! Node network configuration
//!
//! Plain configuration structs for the node's networking layer. They are
//! built by the process entry point (from defaults or a JSON document) and
//! passed down explicitly; there is no global configuration state.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Default gossip bind address
pub const DEFAULT_GOSSIP_BIND_ADDRESS: &str = "0.0.0.0:15600";

/// Default autopeering bind address
pub const DEFAULT_AUTOPEERING_BIND_ADDRESS: &str = "0.0.0.0:14626";

/// Default seconds between reconnect attempts to a disconnected neighbor
pub const DEFAULT_RECONNECT_INTERVAL_SECS: u64 = 60;

/// Default maximum number of neighbors
pub const DEFAULT_MAX_NEIGHBORS: usize = 5;

/// Default autopeering entry nodes
pub const DEFAULT_ENTRY_NODES: [&str; 3] = [
    "LehlDBPJ6kfcfLOK6kAU4nD7B/BdR7SJhai7yFCbCCM=@enter.hornet.zone:14626",
    "zEiNuQMDfZ6F8QDisa1ndX32ykBTyYCxbtkO0vkaWd0=@enter.manapotion.io:18626",
    "npLI53UCxBvOJaV0xv/mzWuV+f+pduc6GzE83jM/5uo=@autopeering.tanglebay.org:14626",
];

/// Network configuration of a node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Prefer IPv6 for neighbors added through the API
    #[serde(rename = "preferIPv6")]
    pub prefer_ipv6: bool,
    /// Gossip server settings
    pub gossip: GossipConfig,
    /// Static neighbor settings
    pub neighbors: NeighborsConfig,
    /// Autopeering settings
    pub autopeering: AutopeeringConfig,
}

/// Gossip TCP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GossipConfig {
    /// Bind address of the gossip TCP server
    pub bind_address: String,
    /// Seconds to wait before reconnecting to a disconnected neighbor
    #[serde(rename = "reconnectAttemptIntervalSeconds")]
    pub reconnect_attempt_interval_secs: u64,
}

impl Default for GossipConfig {
    fn default() -> Self {
        GossipConfig {
            bind_address: DEFAULT_GOSSIP_BIND_ADDRESS.to_string(),
            reconnect_attempt_interval_secs: DEFAULT_RECONNECT_INTERVAL_SECS,
        }
    }
}

/// Static neighbor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeighborsConfig {
    /// Accept inbound connections from unknown neighbors
    pub accept_any_neighbor_connection: bool,
    /// Maximum number of neighbors
    pub max_neighbors: usize,
    /// Statically configured neighbors
    pub neighbors: Vec<NeighborConfig>,
}

impl Default for NeighborsConfig {
    fn default() -> Self {
        NeighborsConfig {
            accept_any_neighbor_connection: false,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            neighbors: Vec::new(),
        }
    }
}

/// A statically configured neighbor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeighborConfig {
    /// Peer identity (multiaddress or public key)
    pub identity: String,
    /// Display alias
    pub alias: String,
    /// Prefer IPv6 when connecting to this neighbor
    #[serde(rename = "preferIPv6")]
    pub prefer_ipv6: bool,
}

/// Autopeering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutopeeringConfig {
    /// Entry nodes in `base64-public-key@host:port` form
    pub entry_nodes: Vec<String>,
    /// Bind address for autopeering
    pub bind_address: String,
    /// Base64 seed for the node identity (random identity when absent)
    pub seed: Option<String>,
    /// Act as an autopeering entry node
    pub run_as_entry_node: bool,
}

impl Default for AutopeeringConfig {
    fn default() -> Self {
        AutopeeringConfig {
            entry_nodes: DEFAULT_ENTRY_NODES.iter().map(|s| s.to_string()).collect(),
            bind_address: DEFAULT_AUTOPEERING_BIND_ADDRESS.to_string(),
            seed: None,
            run_as_entry_node: false,
        }
    }
}

impl NetworkConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: NetworkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the gossip bind address
    pub fn with_gossip_bind_address(mut self, address: impl Into<String>) -> Self {
        self.gossip.bind_address = address.into();
        self
    }

    /// Add a static neighbor
    pub fn with_neighbor(mut self, neighbor: NeighborConfig) -> Self {
        self.neighbors.neighbors.push(neighbor);
        self
    }

    /// Interval between reconnect attempts
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.gossip.reconnect_attempt_interval_secs)
    }

    /// Parsed gossip bind address
    pub fn gossip_bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_socket_addr("gossip.bindAddress", &self.gossip.bind_address)
    }

    /// Parsed autopeering bind address
    pub fn autopeering_bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_socket_addr("autopeering.bindAddress", &self.autopeering.bind_address)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gossip_bind_addr()?;
        self.autopeering_bind_addr()?;

        if self.neighbors.max_neighbors == 0 {
            return Err(ConfigError::invalid_value(
                "neighbors.maxNeighbors",
                "must be at least 1",
            ));
        }

        for (index, neighbor) in self.neighbors.neighbors.iter().enumerate() {
            if neighbor.identity.trim().is_empty() {
                return Err(ConfigError::EmptyNeighborIdentity { index });
            }
        }

        for entry in &self.autopeering.entry_nodes {
            validate_entry_node(entry)?;
        }

        Ok(())
    }
}

fn parse_socket_addr(field: &'static str, value: &str) -> Result<SocketAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

/// Entry nodes look like `key@host:port`; the host may be a DNS name.
fn validate_entry_node(entry: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidEntryNode(entry.to_string());

    let (key, address) = entry.split_once('@').ok_or_else(invalid)?;
    if key.is_empty() {
        return Err(invalid());
    }
    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }
    Ok(())
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An address field does not parse as `ip:port`
    #[error("Invalid address for {field}: {value}")]
    InvalidAddress {
        /// Configuration field
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// An autopeering entry node is not in `key@host:port` form
    #[error("Invalid autopeering entry node: {0}")]
    InvalidEntryNode(String),

    /// A static neighbor has no identity
    #[error("Neighbor at index {index} has an empty identity")]
    EmptyNeighborIdentity {
        /// Position in the neighbor list
        index: usize,
    },

    /// A value is out of its allowed range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Configuration field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// JSON document could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
