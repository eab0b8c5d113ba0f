//! Property tests for the snapshot stream
//!
//! - Arbitrary SEP lists, output counts and diffs survive a round trip in order
//! - Every strict prefix of a valid stream is rejected as malformed
//! - Flipping the network id is always caught before any consumer runs

mod common;

use std::io::Cursor;

use common::*;
use proptest::prelude::*;
use tangle_core::{BlockId, MilestoneId, TreasuryOutput};
use tangle_snapshot::{
    from_iter, stream_snapshot_data_from, stream_snapshot_data_to, CollectingConsumer, FileHeader,
    NoRecords, SnapshotError,
};

fn arb_block_ids() -> impl Strategy<Value = Vec<BlockId>> {
    prop::collection::vec(any::<[u8; 32]>().prop_map(BlockId::from_bytes), 0..40)
}

fn write(
    full: bool,
    separators: Vec<BlockId>,
    output_count: u64,
    first_diff: u32,
    diff_count: u32,
) -> (FileHeader, Vec<u8>) {
    let last_diff = first_diff + diff_count;
    let header = if full {
        FileHeader::full(
            params().network_id(),
            first_diff,
            last_diff,
            TreasuryOutput::unspent(MilestoneId::from_bytes([3; 32]), 1),
        )
    } else {
        FileHeader::delta(params().network_id(), first_diff, last_diff)
    };

    let mut buf = Vec::new();
    let mut diffs = SeededDiffs::new(first_diff + 1, last_diff);
    if full {
        stream_snapshot_data_to(
            &mut buf,
            0,
            &header,
            &mut from_iter(separators),
            &mut outputs(output_count),
            &mut diffs,
        )
        .unwrap();
    } else {
        stream_snapshot_data_to(
            &mut buf,
            0,
            &header,
            &mut from_iter(separators),
            &mut NoRecords,
            &mut diffs,
        )
        .unwrap();
    }
    (header, buf)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stream_round_trip_preserves_order(
        full in any::<bool>(),
        separators in arb_block_ids(),
        output_count in 0u64..50,
        first_diff in 0u32..1_000_000,
        diff_count in 0u32..12,
    ) {
        let (header, bytes) =
            write(full, separators.clone(), output_count, first_diff, diff_count);

        let mut consumer = CollectingConsumer::default();
        let summary =
            stream_snapshot_data_from(Cursor::new(&bytes), &params(), &mut consumer).unwrap();

        prop_assert_eq!(consumer.header.map(|h| h.header), Some(header));
        prop_assert_eq!(consumer.solid_entry_points, separators);
        prop_assert_eq!(summary.bytes_read, bytes.len() as u64);
        prop_assert_eq!(summary.counts.milestone_diffs, diff_count as u64);

        if full {
            let mut expected = outputs(output_count);
            for output in &consumer.outputs {
                let next = expected.next_record();
                prop_assert_eq!(Some(output), next.as_ref());
            }
            prop_assert_eq!(consumer.outputs.len() as u64, output_count);
            prop_assert!(consumer.treasury_output.is_some());
        } else {
            prop_assert!(consumer.outputs.is_empty());
            prop_assert!(consumer.treasury_output.is_none());
        }

        let indices: Vec<u32> =
            consumer.milestone_diffs.iter().map(|d| d.milestone_index).collect();
        let expected: Vec<u32> = (first_diff + 1..=first_diff + diff_count).collect();
        prop_assert_eq!(indices, expected);
    }

    #[test]
    fn every_prefix_is_malformed(
        full in any::<bool>(),
        separators in arb_block_ids(),
        diff_count in 0u32..4,
        cut in any::<prop::sample::Index>(),
    ) {
        let (_, bytes) = write(full, separators, 3, 10, diff_count);
        let len = cut.index(bytes.len());

        let result = stream_snapshot_data_from(
            Cursor::new(&bytes[..len]),
            &params(),
            &mut CollectingConsumer::default(),
        );
        prop_assert!(matches!(result, Err(SnapshotError::MalformedData(_))));
    }

    #[test]
    fn network_id_corruption_is_caught(
        byte in 2usize..10,
        mask in 1u8..=255,
    ) {
        let (_, mut bytes) = write(true, vec![], 2, 5, 2);
        bytes[byte] ^= mask;

        let mut log = CallLog::default();
        let err = stream_snapshot_data_from(Cursor::new(bytes), &params(), &mut log).unwrap_err();
        prop_assert!(
            matches!(err, SnapshotError::NetworkMismatch { .. }),
            "unexpected error: {:?}",
            err
        );
        prop_assert!(log.calls.is_empty());
    }
}
