//! Ledger snapshot streaming for the tangle node
//!
//! This crate serializes the ledger state to a binary snapshot file and
//! reads it back without ever holding more than one record in memory:
//!
//! - Format: little-endian binary codecs for the header and every record kind
//! - Writer: pulls records from producers and frames them section by section
//! - Reader: gates on version and network, then pushes records into consumers
//! - Files: crash-safe creation (temp file, fsync, rename) and header inspection
//! - Ledger: an in-memory UTXO ledger usable as snapshot source and target
//!
//! # Example
//!
//! ```ignore
//! use tangle_snapshot::{from_iter, stream_snapshot_data_to, FileHeader, NoRecords};
//!
//! let header = FileHeader::delta(params.network_id(), sep_index, ledger_index);
//! let info = stream_snapshot_data_to(
//!     &mut sink,
//!     timestamp,
//!     &header,
//!     &mut from_iter(solid_entry_points),
//!     &mut NoRecords,
//!     &mut from_iter(diffs),
//! )?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checksum; // Byte count and CRC32 over a stream
pub mod config; // Decode limits, buffers, sync policy
pub mod consumer; // Read-side visitor traits
pub mod error; // SnapshotError, Section
pub mod file; // Crash-safe snapshot files
pub mod format; // Binary on-disk format
pub mod ledger; // In-memory reference ledger
pub mod producer; // Write-side record producers
pub mod reader; // Streaming reader
pub mod types; // Milestone diffs, counts, summaries
pub mod writer; // Streaming writer

pub use checksum::{ChecksumReader, ChecksumWriter};
pub use config::SnapshotConfig;
pub use consumer::{
    CollectingConsumer, MilestoneDiffConsumer, OutputConsumer, SnapshotConsumer,
    SolidEntryPointConsumer, TreasuryOutputConsumer,
};
pub use error::{CallbackError, Section, SnapshotError, SnapshotResult};
pub use file::{
    cleanup_temp_files, read_snapshot_file, read_snapshot_file_header, temp_path_for,
    write_snapshot_file,
};
pub use format::{FileHeader, ReadFileHeader, SnapshotType, SUPPORTED_FORMAT_VERSION};
pub use ledger::{LedgerError, LedgerLoader, LedgerReadGuard, MemoryLedger};
pub use producer::{from_iter, IterProducer, NoRecords, RecordProducer};
pub use reader::{read_header, stream_snapshot_data_from, SnapshotStreamReader};
pub use types::{MilestoneDiff, MilestonePayload, ReadSummary, SnapshotCounts, SnapshotInfo};
pub use writer::{stream_snapshot_data_to, SnapshotStreamWriter};
