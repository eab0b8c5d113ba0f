//! Snapshot record and result types

use tangle_core::{MilestoneIndex, Output, Spent, TreasuryOutput};

use crate::format::header::ReadFileHeader;

/// A signed milestone payload, carried as opaque bytes.
///
/// The snapshot engine never looks inside; it only needs the length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MilestonePayload(Vec<u8>);

impl MilestonePayload {
    /// Wrap serialized payload bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        MilestonePayload(bytes)
    }

    /// Serialized payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the payload bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for MilestonePayload {
    fn from(bytes: Vec<u8>) -> Self {
        MilestonePayload(bytes)
    }
}

/// Ledger changes confirmed by a single milestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneDiff {
    /// Index of the milestone
    pub milestone_index: MilestoneIndex,
    /// Signed milestone payload
    pub milestone: MilestonePayload,
    /// Outputs created by the milestone
    pub created: Vec<Output>,
    /// Outputs consumed by the milestone
    pub consumed: Vec<Spent>,
    /// Treasury output spent by the milestone's receipt, if any
    pub spent_treasury_output: Option<TreasuryOutput>,
}

impl MilestoneDiff {
    /// Create a diff without ledger changes
    pub fn new(milestone_index: MilestoneIndex, milestone: MilestonePayload) -> Self {
        MilestoneDiff {
            milestone_index,
            milestone,
            created: Vec::new(),
            consumed: Vec::new(),
            spent_treasury_output: None,
        }
    }

    /// Set the created outputs
    pub fn with_created(mut self, created: Vec<Output>) -> Self {
        self.created = created;
        self
    }

    /// Set the consumed outputs
    pub fn with_consumed(mut self, consumed: Vec<Spent>) -> Self {
        self.consumed = consumed;
        self
    }

    /// Set the spent treasury output
    pub fn with_spent_treasury_output(mut self, output: TreasuryOutput) -> Self {
        self.spent_treasury_output = Some(output);
        self
    }
}

/// Number of records per section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotCounts {
    /// Solid entry points
    pub solid_entry_points: u64,
    /// Unspent outputs (always zero for delta snapshots)
    pub outputs: u64,
    /// Milestone diffs
    pub milestone_diffs: u64,
}

/// Information about a written snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// Records written per section
    pub counts: SnapshotCounts,
    /// Total bytes written
    pub bytes_written: u64,
    /// CRC32 of every byte written
    pub crc: u32,
}

/// Information about a fully read snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSummary {
    /// Decoded header and write timestamp
    pub header: ReadFileHeader,
    /// Records read per section
    pub counts: SnapshotCounts,
    /// Total bytes consumed from the source
    pub bytes_read: u64,
    /// CRC32 of every byte consumed
    pub crc: u32,
}
