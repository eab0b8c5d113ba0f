//! Streaming snapshot reader
//!
//! Decodes a snapshot stream front to back and pushes every record into a
//! [`SnapshotConsumer`]. The header is gated on format version and network
//! identity before any section is touched; any decode or consumer error
//! aborts the whole read.
//!
//! The reader stops right after the diff section terminator and never looks
//! at trailing bytes, so a snapshot can be embedded in a larger stream.

use std::io::Read;

use tracing::{debug, info, warn};

use tangle_core::{MilestoneIndex, ProtocolParameters};

use crate::checksum::ChecksumReader;
use crate::config::SnapshotConfig;
use crate::consumer::SnapshotConsumer;
use crate::error::{CallbackError, Section, SnapshotError, SnapshotResult};
use crate::format::header::{decode_header, ReadFileHeader, SnapshotType};
use crate::format::primitives::{decode_marker, decode_u32};
use crate::format::records::{
    check_diff_order, decode_milestone_diff, decode_output, decode_solid_entry_point,
};
use crate::types::{ReadSummary, SnapshotCounts};

/// Reads snapshot streams from a source
pub struct SnapshotStreamReader<R> {
    source: R,
    config: SnapshotConfig,
}

impl<R: Read> SnapshotStreamReader<R> {
    /// Create a reader with the given decode limits
    pub fn new(source: R, config: SnapshotConfig) -> Self {
        SnapshotStreamReader { source, config }
    }

    /// Decode limits
    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Unwrap the source
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Decode only the header and write timestamp
    pub fn read_header(&mut self, params: &ProtocolParameters) -> SnapshotResult<ReadFileHeader> {
        read_file_header(&mut self.source, params).map_err(log_rejection)
    }

    /// Read a complete snapshot stream into `consumer`.
    ///
    /// On success every section was consumed and `on_complete` was invoked.
    /// On error the consumer may have seen a prefix of the records and must
    /// discard them.
    pub fn read<C>(
        &mut self,
        params: &ProtocolParameters,
        consumer: &mut C,
    ) -> SnapshotResult<ReadSummary>
    where
        C: SnapshotConsumer + ?Sized,
    {
        self.read_inner(params, consumer).map_err(log_rejection)
    }

    fn read_inner<C>(
        &mut self,
        params: &ProtocolParameters,
        consumer: &mut C,
    ) -> SnapshotResult<ReadSummary>
    where
        C: SnapshotConsumer + ?Sized,
    {
        let config = self.config;
        let mut source = ChecksumReader::new(&mut self.source);
        let mut counts = SnapshotCounts::default();

        let file_header = read_file_header(&mut source, params)?;
        let header = file_header.header;
        debug!(
            target: "tangle::snapshot",
            snapshot_type = %header.snapshot_type,
            sep_milestone_index = header.sep_milestone_index,
            ledger_milestone_index = header.ledger_milestone_index,
            timestamp = file_header.timestamp,
            "Read snapshot header"
        );
        consumer
            .on_header(&file_header)
            .map_err(consumer_error(Section::Header))?;

        counts.solid_entry_points = read_section(
            &mut source,
            Section::SolidEntryPoints,
            |src| decode_solid_entry_point(src),
            |sep| consumer.on_solid_entry_point(sep),
        )?;

        if header.snapshot_type == SnapshotType::Full {
            counts.outputs = read_section(
                &mut source,
                Section::Outputs,
                |src| decode_output(src),
                |output| consumer.on_output(output),
            )?;

            // Present for every full header that passed validation.
            if let Some(treasury) = header.treasury_output {
                consumer
                    .on_unspent_treasury_output(treasury)
                    .map_err(consumer_error(Section::TreasuryOutput))?;
            }
        }

        let mut previous: Option<MilestoneIndex> = None;
        counts.milestone_diffs = read_section(
            &mut source,
            Section::MilestoneDiffs,
            |src| {
                let diff = decode_milestone_diff(src, &config)?;
                check_diff_order(&mut previous, diff.milestone_index)?;
                Ok(diff)
            },
            |diff| consumer.on_milestone_diff(diff),
        )?;

        let summary = ReadSummary {
            header: file_header,
            counts,
            bytes_read: source.bytes_read(),
            crc: source.crc(),
        };
        // Reported against the last section read.
        consumer
            .on_complete(&summary)
            .map_err(consumer_error(Section::MilestoneDiffs))?;

        info!(
            target: "tangle::snapshot",
            snapshot_type = %header.snapshot_type,
            solid_entry_points = counts.solid_entry_points,
            outputs = counts.outputs,
            milestone_diffs = counts.milestone_diffs,
            bytes = summary.bytes_read,
            crc = summary.crc,
            "Snapshot read"
        );
        Ok(summary)
    }
}

/// Read a snapshot stream with the default limits
pub fn stream_snapshot_data_from<R, C>(
    source: R,
    params: &ProtocolParameters,
    consumer: &mut C,
) -> SnapshotResult<ReadSummary>
where
    R: Read,
    C: SnapshotConsumer + ?Sized,
{
    SnapshotStreamReader::new(source, SnapshotConfig::default()).read(params, consumer)
}

/// Decode only the header and write timestamp of a snapshot stream
pub fn read_header<R: Read>(
    source: R,
    params: &ProtocolParameters,
) -> SnapshotResult<ReadFileHeader> {
    SnapshotStreamReader::new(source, SnapshotConfig::default()).read_header(params)
}

fn read_file_header<R: Read + ?Sized>(
    reader: &mut R,
    params: &ProtocolParameters,
) -> SnapshotResult<ReadFileHeader> {
    let header = decode_header(reader, params)?;
    let timestamp = decode_u32(reader, "snapshot timestamp")?;
    Ok(ReadFileHeader { header, timestamp })
}

fn consumer_error(section: Section) -> impl FnOnce(CallbackError) -> SnapshotError {
    move |source| SnapshotError::Consumer { section, source }
}

fn log_rejection(err: SnapshotError) -> SnapshotError {
    if err.is_protocol_incompatibility() || err.is_corruption() {
        warn!(target: "tangle::snapshot", error = %err, "Rejected snapshot stream");
    }
    err
}

/// Decode one marker-framed section, handing each record to `consume`
fn read_section<Src, T, D, C>(
    reader: &mut Src,
    section: Section,
    mut decode: D,
    mut consume: C,
) -> SnapshotResult<u64>
where
    Src: Read + ?Sized,
    D: FnMut(&mut Src) -> SnapshotResult<T>,
    C: FnMut(T) -> Result<(), CallbackError>,
{
    let mut count = 0u64;
    while decode_marker(reader, section.name())? {
        let record = decode(reader)?;
        consume(record).map_err(consumer_error(section))?;
        count += 1;
    }

    debug!(target: "tangle::snapshot", section = %section, count, "Read snapshot section");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::CollectingConsumer;
    use crate::format::header::FileHeader;
    use crate::producer::{from_iter, NoRecords};
    use crate::types::{MilestoneDiff, MilestonePayload};
    use crate::writer::stream_snapshot_data_to;
    use std::io::Cursor;
    use tangle_core::{BlockId, MilestoneId, TreasuryOutput};

    fn params() -> ProtocolParameters {
        ProtocolParameters::new("testnet-reader")
    }

    fn delta_bytes(diffs: Vec<MilestoneDiff>) -> Vec<u8> {
        let header = FileHeader::delta(params().network_id(), 5, 9);
        let mut buf = Vec::new();
        stream_snapshot_data_to(
            &mut buf,
            1_700_000_000,
            &header,
            &mut from_iter(vec![BlockId::from_bytes([4u8; 32])]),
            &mut NoRecords,
            &mut from_iter(diffs),
        )
        .unwrap();
        buf
    }

    #[test]
    fn test_read_header_only() {
        let bytes = delta_bytes(vec![]);
        let read = read_header(Cursor::new(bytes), &params()).unwrap();
        assert_eq!(read.timestamp, 1_700_000_000);
        assert_eq!(read.header.snapshot_type, SnapshotType::Delta);
        assert_eq!(read.header.ledger_milestone_index, 9);
    }

    #[test]
    fn test_summary_matches_stream() {
        let bytes = delta_bytes(vec![MilestoneDiff::new(6, MilestonePayload::new(vec![1, 2]))]);
        let mut consumer = CollectingConsumer::default();
        let summary =
            stream_snapshot_data_from(Cursor::new(&bytes), &params(), &mut consumer).unwrap();

        assert_eq!(summary.bytes_read, bytes.len() as u64);
        assert_eq!(summary.crc, crc32fast::hash(&bytes));
        assert_eq!(summary.counts.solid_entry_points, 1);
        assert_eq!(summary.counts.milestone_diffs, 1);
        assert_eq!(consumer.summary, Some(summary));
        assert!(consumer.treasury_output.is_none());
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut bytes = delta_bytes(vec![]);
        let len = bytes.len() as u64;
        bytes.extend_from_slice(b"trailer");

        let mut reader = SnapshotStreamReader::new(Cursor::new(bytes), SnapshotConfig::default());
        let summary = reader.read(&params(), &mut CollectingConsumer::default()).unwrap();
        assert_eq!(summary.bytes_read, len);
        assert_eq!(reader.into_inner().position(), len);
    }

    #[test]
    fn test_out_of_order_diffs_rejected_on_read() {
        let mut bytes = delta_bytes(vec![
            MilestoneDiff::new(6, MilestonePayload::default()),
            MilestoneDiff::new(7, MilestonePayload::default()),
        ]);
        // Each empty diff is marker + 17 bytes; rewrite the second index.
        let second_index = bytes.len() - 1 - 17;
        bytes[second_index..second_index + 4].copy_from_slice(&6u32.to_le_bytes());

        let mut consumer = CollectingConsumer::default();
        let err =
            stream_snapshot_data_from(Cursor::new(bytes), &params(), &mut consumer).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::DiffOutOfOrder {
                previous: 6,
                current: 6
            }
        ));
    }

    #[test]
    fn test_unknown_marker_is_malformed() {
        let mut bytes = delta_bytes(vec![]);
        let header_len = FileHeader::delta(0, 0, 0).encoded_len() + 4;
        bytes[header_len] = 0x02;

        let mut consumer = CollectingConsumer::default();
        let err =
            stream_snapshot_data_from(Cursor::new(bytes), &params(), &mut consumer).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::MalformedData(ref m) if m.contains("solid entry points")
        ));
    }

    #[test]
    fn test_treasury_consumer_receives_header_treasury() {
        let treasury = TreasuryOutput::unspent(MilestoneId::from_bytes([8u8; 32]), 13_337);
        let header = FileHeader::full(params().network_id(), 3, 3, treasury);
        let mut buf = Vec::new();
        stream_snapshot_data_to(
            &mut buf,
            0,
            &header,
            &mut NoRecords,
            &mut NoRecords,
            &mut NoRecords,
        )
        .unwrap();

        let mut consumer = CollectingConsumer::default();
        stream_snapshot_data_from(Cursor::new(buf), &params(), &mut consumer).unwrap();
        assert_eq!(consumer.treasury_output, Some(treasury));
        assert!(consumer.outputs.is_empty());
    }
}
