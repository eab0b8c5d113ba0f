//! Snapshot file header
//!
//! # Layout
//!
//! ```text
//! ┌────────────┬──────────┬─────────────────┬───────────────┬──────────────────┐
//! │ Version (1)│ Type (1) │ Network ID (8)  │ SEP Index (4) │ Ledger Index (4) │
//! └────────────┴──────────┴─────────────────┴───────────────┴──────────────────┘
//!
//! Full snapshots only:
//! ┌──────────────────────────┬────────────┬───────────┐
//! │ Treasury Milestone (32)  │ Amount (8) │ Spent (1) │
//! └──────────────────────────┴────────────┴───────────┘
//! ```
//!
//! The version byte comes first and is checked before anything else is
//! interpreted, so a future format can change every later field.

use std::fmt;
use std::io::{Read, Write};

use tangle_core::{
    MilestoneIndex, MilestoneTimestamp, NetworkId, ProtocolParameters, TreasuryOutput,
};

use crate::error::{SnapshotError, SnapshotResult};
use crate::format::primitives::{
    decode_u32, decode_u64, decode_u8, encode_u32, encode_u64, encode_u8,
};
use crate::format::records::{
    decode_treasury_output, encode_treasury_output, TREASURY_OUTPUT_ENCODED_LEN,
};
use crate::format::SUPPORTED_FORMAT_VERSION;

/// Size of the fixed part of the header
pub const HEADER_FIXED_LEN: usize = 1 + 1 + 8 + 4 + 4;

/// Kind of snapshot file
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotType {
    /// Complete ledger state: unspent outputs plus the diffs back to the
    /// SEP milestone
    Full = 0x00,
    /// Diffs only, applied on top of an earlier full snapshot
    Delta = 0x01,
}

impl SnapshotType {
    /// Tag byte on the wire
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether the outputs section and treasury output are present
    pub fn is_full(self) -> bool {
        self == SnapshotType::Full
    }
}

impl TryFrom<u8> for SnapshotType {
    type Error = SnapshotError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(SnapshotType::Full),
            0x01 => Ok(SnapshotType::Delta),
            other => Err(SnapshotError::InvalidSnapshotType(other)),
        }
    }
}

impl fmt::Display for SnapshotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotType::Full => write!(f, "full"),
            SnapshotType::Delta => write!(f, "delta"),
        }
    }
}

/// Snapshot file header.
///
/// Metadata only: record counts are not stored, every section is closed by
/// a terminator on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Format version
    pub version: u8,
    /// Full or delta
    pub snapshot_type: SnapshotType,
    /// Network the snapshot belongs to
    pub network_id: NetworkId,
    /// Milestone at which the solid entry points were captured
    pub sep_milestone_index: MilestoneIndex,
    /// Milestone the ledger state reflects
    pub ledger_milestone_index: MilestoneIndex,
    /// Unspent treasury output, present only for full snapshots
    pub treasury_output: Option<TreasuryOutput>,
}

impl FileHeader {
    /// Create a full snapshot header at the supported format version
    pub fn full(
        network_id: NetworkId,
        sep_milestone_index: MilestoneIndex,
        ledger_milestone_index: MilestoneIndex,
        treasury_output: TreasuryOutput,
    ) -> Self {
        FileHeader {
            version: SUPPORTED_FORMAT_VERSION,
            snapshot_type: SnapshotType::Full,
            network_id,
            sep_milestone_index,
            ledger_milestone_index,
            treasury_output: Some(treasury_output),
        }
    }

    /// Create a delta snapshot header at the supported format version
    pub fn delta(
        network_id: NetworkId,
        sep_milestone_index: MilestoneIndex,
        ledger_milestone_index: MilestoneIndex,
    ) -> Self {
        FileHeader {
            version: SUPPORTED_FORMAT_VERSION,
            snapshot_type: SnapshotType::Delta,
            network_id,
            sep_milestone_index,
            ledger_milestone_index,
            treasury_output: None,
        }
    }

    /// Check the header invariants.
    ///
    /// - `ledger_milestone_index >= sep_milestone_index`
    /// - a full header carries an unspent treasury output
    /// - a delta header carries none
    pub fn validate(&self) -> SnapshotResult<()> {
        if self.ledger_milestone_index < self.sep_milestone_index {
            return Err(SnapshotError::invalid_header(format!(
                "ledger milestone index {} is below SEP milestone index {}",
                self.ledger_milestone_index, self.sep_milestone_index
            )));
        }

        match (self.snapshot_type, &self.treasury_output) {
            (SnapshotType::Full, None) => Err(SnapshotError::invalid_header(
                "full snapshot without treasury output",
            )),
            (SnapshotType::Full, Some(treasury)) if treasury.spent => Err(
                SnapshotError::invalid_header("full snapshot treasury output is already spent"),
            ),
            (SnapshotType::Delta, Some(_)) => Err(SnapshotError::invalid_header(
                "delta snapshot must not carry a treasury output",
            )),
            _ => Ok(()),
        }
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        match self.snapshot_type {
            SnapshotType::Full => HEADER_FIXED_LEN + TREASURY_OUTPUT_ENCODED_LEN,
            SnapshotType::Delta => HEADER_FIXED_LEN,
        }
    }
}

/// A decoded header together with the timestamp written after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFileHeader {
    /// The file header
    pub header: FileHeader,
    /// Unix timestamp (seconds) at which the snapshot was written
    pub timestamp: MilestoneTimestamp,
}

/// Encode a header into a new buffer
pub fn encode_header(header: &FileHeader) -> SnapshotResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(header.encoded_len());
    write_header(&mut buf, header)?;
    Ok(buf)
}

/// Validate and write a header
pub fn write_header<W: Write + ?Sized>(writer: &mut W, header: &FileHeader) -> SnapshotResult<()> {
    if header.version != SUPPORTED_FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            version: header.version,
            supported: SUPPORTED_FORMAT_VERSION,
        });
    }
    header.validate()?;

    encode_u8(writer, header.version)?;
    encode_u8(writer, header.snapshot_type.as_u8())?;
    encode_u64(writer, header.network_id)?;
    encode_u32(writer, header.sep_milestone_index)?;
    encode_u32(writer, header.ledger_milestone_index)?;
    if let Some(treasury) = &header.treasury_output {
        encode_treasury_output(writer, treasury)?;
    }
    Ok(())
}

/// Decode a header, gating on format version and network identity.
///
/// Nothing past the version byte is read if the version is unsupported, and
/// nothing past the network id is read if it belongs to another network.
pub fn decode_header<R: Read + ?Sized>(
    reader: &mut R,
    params: &ProtocolParameters,
) -> SnapshotResult<FileHeader> {
    let version = decode_u8(reader, "format version")?;
    if version != SUPPORTED_FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            version,
            supported: SUPPORTED_FORMAT_VERSION,
        });
    }

    let snapshot_type = SnapshotType::try_from(decode_u8(reader, "snapshot type")?)?;

    let network_id = decode_u64(reader, "network id")?;
    let expected = params.network_id();
    if network_id != expected {
        return Err(SnapshotError::NetworkMismatch {
            expected,
            actual: network_id,
        });
    }

    let sep_milestone_index = decode_u32(reader, "SEP milestone index")?;
    let ledger_milestone_index = decode_u32(reader, "ledger milestone index")?;

    let treasury_output = match snapshot_type {
        SnapshotType::Full => Some(decode_treasury_output(reader)?),
        SnapshotType::Delta => None,
    };

    let header = FileHeader {
        version,
        snapshot_type,
        network_id,
        sep_milestone_index,
        ledger_milestone_index,
        treasury_output,
    };
    header.validate()?;
    Ok(header)
}
