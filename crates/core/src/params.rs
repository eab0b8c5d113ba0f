//! Protocol parameters
//!
//! The subset of protocol parameters the node needs outside of consensus.
//! Most importantly they define the network identity that gates which
//! snapshot files a node will accept.

use serde::{Deserialize, Serialize};

use crate::types::NetworkId;

/// Protocol parameters of a ledger network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolParameters {
    /// Protocol version
    pub version: u8,
    /// Human readable network name (e.g. "mainnet", "testnet")
    pub network_name: String,
    /// Bech32 human readable part for addresses
    pub bech32_hrp: String,
    /// Minimum proof-of-work score for blocks
    pub min_pow_score: u32,
    /// Maximum milestone distance for a block to be attachable
    pub below_max_depth: u8,
    /// Total supply of base tokens
    pub token_supply: u64,
}

impl ProtocolParameters {
    /// Create parameters for the named network with default values
    pub fn new(network_name: impl Into<String>) -> Self {
        ProtocolParameters {
            network_name: network_name.into(),
            ..Default::default()
        }
    }

    /// Set the bech32 human readable part
    pub fn with_bech32_hrp(mut self, hrp: impl Into<String>) -> Self {
        self.bech32_hrp = hrp.into();
        self
    }

    /// Set the token supply
    pub fn with_token_supply(mut self, token_supply: u64) -> Self {
        self.token_supply = token_supply;
        self
    }

    /// Network identity derived from the network name
    pub fn network_id(&self) -> NetworkId {
        network_id_from_name(&self.network_name)
    }
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        ProtocolParameters {
            version: 2,
            network_name: "testnet".to_string(),
            bech32_hrp: "rms".to_string(),
            min_pow_score: 0,
            below_max_depth: 15,
            token_supply: 0,
        }
    }
}

/// Derive the 64-bit network identity from a network name (XXH3-64)
pub fn network_id_from_name(network_name: &str) -> NetworkId {
    xxhash_rust::xxh3::xxh3_64(network_name.as_bytes())
}
