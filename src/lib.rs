//! Tangle - ledger snapshots for a UTXO tangle node
//!
//! Facade over the workspace crates:
//!
//! - [`tangle_core`]: identifiers, UTXO records, protocol parameters and
//!   node network configuration
//! - [`tangle_snapshot`]: snapshot file format, streaming writer and reader,
//!   crash-safe snapshot files and the in-memory reference ledger
//!
//! # Quick Start
//!
//! ```ignore
//! use tangle::{MemoryLedger, ProtocolParameters, SnapshotConfig};
//!
//! let params = ProtocolParameters::new("testnet");
//! let ledger = MemoryLedger::new();
//! tangle::read_snapshot_file(path, &params, &SnapshotConfig::default(), &mut ledger.loader())?;
//! ```

pub use tangle_core::{
    network_id_from_name, to_hex, Address, AutopeeringConfig, BlockId, ConfigError, GossipConfig,
    MilestoneId, MilestoneIndex, MilestoneTimestamp, NeighborConfig, NeighborsConfig, NetworkConfig,
    NetworkId, Output, OutputId, ProtocolParameters, Spent, TransactionId, TreasuryOutput,
};
pub use tangle_snapshot::*;

pub use tangle_core;
pub use tangle_snapshot;
