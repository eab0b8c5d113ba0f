//! Core types for the tangle node
//!
//! This crate defines the foundational types used throughout the node:
//! - Identifiers: BlockId, MilestoneId, TransactionId, OutputId, Address
//! - UTXO records: Output, Spent, TreasuryOutput
//! - Protocol parameters and network identity
//! - Network configuration (gossip, neighbors, autopeering)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod params;
pub mod types;
pub mod utxo;

pub use config::{
    AutopeeringConfig, ConfigError, GossipConfig, NeighborConfig, NeighborsConfig, NetworkConfig,
};
pub use params::{network_id_from_name, ProtocolParameters};
pub use types::{
    to_hex, Address, BlockId, MilestoneId, MilestoneIndex, MilestoneTimestamp, NetworkId, OutputId,
    TransactionId,
};
pub use utxo::{Output, Spent, TreasuryOutput};
