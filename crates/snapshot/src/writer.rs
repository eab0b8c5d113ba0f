//! Streaming snapshot writer
//!
//! Pulls records from producers one at a time and frames them onto a sink in
//! file order: header, timestamp, solid entry points, outputs (full only),
//! milestone diffs. Only the record in flight is held in memory.
//!
//! Bytes already written are not rolled back when a producer fails. Write to
//! a temporary location and rename on success when the output must be
//! all-or-nothing, as [`write_snapshot_file`](crate::file::write_snapshot_file)
//! does.

use std::io::Write;

use tracing::{debug, info};

use tangle_core::{BlockId, MilestoneIndex, MilestoneTimestamp, Output};

use crate::checksum::ChecksumWriter;
use crate::config::SnapshotConfig;
use crate::error::{Section, SnapshotError, SnapshotResult};
use crate::format::header::{write_header, FileHeader, SnapshotType};
use crate::format::primitives::{encode_marker, encode_u32};
use crate::format::records::{
    check_diff_order, encode_milestone_diff, encode_output, encode_solid_entry_point,
    validate_milestone_diff,
};
use crate::producer::RecordProducer;
use crate::types::{MilestoneDiff, SnapshotCounts, SnapshotInfo};

/// Writes snapshot streams to a sink
pub struct SnapshotStreamWriter<W> {
    sink: W,
    config: SnapshotConfig,
}

impl<W: Write> SnapshotStreamWriter<W> {
    /// Create a writer with the given limits
    pub fn new(sink: W, config: SnapshotConfig) -> Self {
        SnapshotStreamWriter { sink, config }
    }

    /// Limits applied to written diffs
    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Access the sink
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Unwrap the sink
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Write a complete snapshot stream.
    ///
    /// The output producer is only polled for full snapshots. Diffs must
    /// arrive in strictly ascending milestone index order and within the
    /// configured limits; an offending diff is rejected before any of its
    /// bytes reach the sink.
    ///
    /// Returns the per-section record counts together with the number of
    /// bytes written and their CRC32.
    pub fn write<S, O, D>(
        &mut self,
        timestamp: MilestoneTimestamp,
        header: &FileHeader,
        sep_producer: &mut S,
        output_producer: &mut O,
        ms_diff_producer: &mut D,
    ) -> SnapshotResult<SnapshotInfo>
    where
        S: RecordProducer<BlockId> + ?Sized,
        O: RecordProducer<Output> + ?Sized,
        D: RecordProducer<MilestoneDiff> + ?Sized,
    {
        let config = self.config;
        let mut sink = ChecksumWriter::new(&mut self.sink);
        let mut counts = SnapshotCounts::default();

        write_header(&mut sink, header)?;
        encode_u32(&mut sink, timestamp)?;
        debug!(
            target: "tangle::snapshot",
            snapshot_type = %header.snapshot_type,
            sep_milestone_index = header.sep_milestone_index,
            ledger_milestone_index = header.ledger_milestone_index,
            timestamp,
            "Wrote snapshot header"
        );

        counts.solid_entry_points = write_section(
            &mut sink,
            Section::SolidEntryPoints,
            sep_producer,
            |_| Ok(()),
            |sink, sep| encode_solid_entry_point(sink, sep),
        )?;

        if header.snapshot_type == SnapshotType::Full {
            counts.outputs = write_section(
                &mut sink,
                Section::Outputs,
                output_producer,
                |_| Ok(()),
                |sink, output| encode_output(sink, output),
            )?;
        }

        let mut previous: Option<MilestoneIndex> = None;
        counts.milestone_diffs = write_section(
            &mut sink,
            Section::MilestoneDiffs,
            ms_diff_producer,
            |diff: &MilestoneDiff| {
                check_diff_order(&mut previous, diff.milestone_index)?;
                validate_milestone_diff(diff, &config)
            },
            |sink, diff| encode_milestone_diff(sink, diff, &config),
        )?;

        sink.flush()?;

        let info = SnapshotInfo {
            counts,
            bytes_written: sink.bytes_written(),
            crc: sink.crc(),
        };
        info!(
            target: "tangle::snapshot",
            snapshot_type = %header.snapshot_type,
            solid_entry_points = counts.solid_entry_points,
            outputs = counts.outputs,
            milestone_diffs = counts.milestone_diffs,
            bytes = info.bytes_written,
            crc = info.crc,
            "Snapshot written"
        );
        Ok(info)
    }
}

/// Write a snapshot stream with the default limits
pub fn stream_snapshot_data_to<W, S, O, D>(
    sink: W,
    timestamp: MilestoneTimestamp,
    header: &FileHeader,
    sep_producer: &mut S,
    output_producer: &mut O,
    ms_diff_producer: &mut D,
) -> SnapshotResult<SnapshotInfo>
where
    W: Write,
    S: RecordProducer<BlockId> + ?Sized,
    O: RecordProducer<Output> + ?Sized,
    D: RecordProducer<MilestoneDiff> + ?Sized,
{
    SnapshotStreamWriter::new(sink, SnapshotConfig::default()).write(
        timestamp,
        header,
        sep_producer,
        output_producer,
        ms_diff_producer,
    )
}

/// Drain a producer into one marker-framed section.
///
/// `check` runs before the record marker so a rejected record leaves no
/// bytes behind.
fn write_section<Sk, T, P, C, E>(
    sink: &mut Sk,
    section: Section,
    producer: &mut P,
    mut check: C,
    mut encode: E,
) -> SnapshotResult<u64>
where
    Sk: Write + ?Sized,
    P: RecordProducer<T> + ?Sized,
    C: FnMut(&T) -> SnapshotResult<()>,
    E: FnMut(&mut Sk, &T) -> SnapshotResult<()>,
{
    let mut count = 0u64;
    while let Some(record) = producer
        .next()
        .map_err(|source| SnapshotError::Producer { section, source })?
    {
        check(&record)?;
        encode_marker(sink, true)?;
        encode(sink, &record)?;
        count += 1;
    }
    encode_marker(sink, false)?;

    debug!(target: "tangle::snapshot", section = %section, count, "Wrote snapshot section");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallbackError;
    use crate::format::{RECORD_FOLLOWS, SECTION_END};
    use crate::producer::{from_iter, NoRecords};
    use crate::types::MilestonePayload;
    use tangle_core::{MilestoneId, ProtocolParameters, TreasuryOutput};

    fn full_header() -> FileHeader {
        FileHeader::full(
            ProtocolParameters::default().network_id(),
            10,
            12,
            TreasuryOutput::unspent(MilestoneId::from_bytes([1u8; 32]), 500),
        )
    }

    fn diff(index: MilestoneIndex) -> MilestoneDiff {
        MilestoneDiff::new(index, MilestonePayload::new(vec![index as u8; 4]))
    }

    #[test]
    fn test_empty_full_snapshot_layout() {
        let header = full_header();
        let mut writer = SnapshotStreamWriter::new(Vec::new(), SnapshotConfig::default());
        let info = writer
            .write(42, &header, &mut NoRecords, &mut NoRecords, &mut NoRecords)
            .unwrap();
        let bytes = writer.into_inner();

        assert_eq!(info.counts, SnapshotCounts::default());
        assert_eq!(info.bytes_written, bytes.len() as u64);
        assert_eq!(info.crc, crc32fast::hash(&bytes));

        let h = header.encoded_len();
        assert_eq!(&bytes[h..h + 4], &42u32.to_le_bytes());
        // SEP, outputs and diff sections, each empty.
        assert_eq!(&bytes[h + 4..], &[SECTION_END, SECTION_END, SECTION_END]);
    }

    #[test]
    fn test_delta_snapshot_skips_outputs() {
        let header = FileHeader::delta(ProtocolParameters::default().network_id(), 10, 12);
        let mut polled = false;
        let mut outputs = || -> Result<Option<Output>, CallbackError> {
            polled = true;
            Ok(None)
        };

        let mut buf = Vec::new();
        let info = stream_snapshot_data_to(
            &mut buf,
            1,
            &header,
            &mut from_iter(vec![BlockId::from_bytes([3u8; 32])]),
            &mut outputs,
            &mut from_iter(vec![diff(11), diff(12)]),
        )
        .unwrap();

        assert!(!polled);
        assert_eq!(info.counts.solid_entry_points, 1);
        assert_eq!(info.counts.outputs, 0);
        assert_eq!(info.counts.milestone_diffs, 2);

        let h = header.encoded_len() + 4;
        assert_eq!(buf[h], RECORD_FOLLOWS);
        assert_eq!(buf[h + 1 + 32], SECTION_END);
        // Diff section starts right after the SEP section.
        assert_eq!(buf[h + 1 + 32 + 1], RECORD_FOLLOWS);
        assert_eq!(*buf.last().unwrap(), SECTION_END);
    }

    #[test]
    fn test_out_of_order_diff_rejected_before_marker() {
        let mut buf = Vec::new();
        let err = stream_snapshot_data_to(
            &mut buf,
            1,
            &full_header(),
            &mut NoRecords,
            &mut NoRecords,
            &mut from_iter(vec![diff(11), diff(11)]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            SnapshotError::DiffOutOfOrder {
                previous: 11,
                current: 11
            }
        ));
        // The first diff is complete and the last byte is its treasury flag.
        assert_eq!(*buf.last().unwrap(), 0);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let config = SnapshotConfig::default().with_max_milestone_payload_len(2);
        let mut writer = SnapshotStreamWriter::new(Vec::new(), config);
        let err = writer
            .write(
                1,
                &full_header(),
                &mut NoRecords,
                &mut NoRecords,
                &mut from_iter(vec![diff(11)]),
            )
            .unwrap_err();
        assert!(matches!(err, SnapshotError::LengthLimitExceeded { .. }));
    }

    #[test]
    fn test_producer_error_carries_section() {
        let mut failing =
            || -> Result<Option<Output>, CallbackError> { Err("utxo store closed".into()) };
        let err = stream_snapshot_data_to(
            Vec::new(),
            1,
            &full_header(),
            &mut NoRecords,
            &mut failing,
            &mut NoRecords,
        )
        .unwrap_err();

        assert_eq!(err.section(), Some(Section::Outputs));
        assert!(err.to_string().contains("utxo store closed"));
    }

    #[test]
    fn test_invalid_header_writes_nothing() {
        let mut header = full_header();
        header.sep_milestone_index = 20;

        let mut buf = Vec::new();
        let err = stream_snapshot_data_to(
            &mut buf,
            1,
            &header,
            &mut NoRecords,
            &mut NoRecords,
            &mut NoRecords,
        )
        .unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidHeader(_)));
        assert!(buf.is_empty());
    }
}
