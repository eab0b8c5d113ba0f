//! Record codecs
//!
//! Stateless encode/decode functions for every record kind carried by a
//! snapshot file.
//!
//! # Binary Format
//!
//! ```text
//! solid entry point: block_id [32]
//! output:            tx_id [32] | index u16 | block_id [32]
//!                    | ms_index_booked u32 | ms_timestamp_booked u32
//!                    | address [32] | amount u64
//! spent:             output | spending_tx_id [32]
//!                    | ms_index_spent u32 | ms_timestamp_spent u32
//! treasury output:   milestone_id [32] | amount u64 | spent u8
//! milestone diff:    ms_index u32 | payload_len u32 | payload
//!                    | created_count u32 | output*
//!                    | consumed_count u32 | spent*
//!                    | has_treasury u8 | [treasury output]
//! ```

use std::io::{Read, Write};

use tangle_core::{
    Address, BlockId, MilestoneId, MilestoneIndex, Output, OutputId, Spent, TransactionId,
    TreasuryOutput,
};

use crate::config::SnapshotConfig;
use crate::error::{SnapshotError, SnapshotResult};
use crate::format::primitives::{
    check_len, decode_array, decode_bytes_with_len, decode_flag, decode_u16, decode_u32,
    decode_u64, encode_array, encode_bytes_with_len, encode_flag, encode_u16, encode_u32,
    encode_u64,
};
use crate::types::{MilestoneDiff, MilestonePayload};

/// Encoded size of an output
pub const OUTPUT_ENCODED_LEN: usize =
    OutputId::LENGTH + BlockId::LENGTH + 4 + 4 + Address::LENGTH + 8;

/// Encoded size of a spent record
pub const SPENT_ENCODED_LEN: usize = OUTPUT_ENCODED_LEN + TransactionId::LENGTH + 4 + 4;

/// Encoded size of a treasury output
pub const TREASURY_OUTPUT_ENCODED_LEN: usize = MilestoneId::LENGTH + 8 + 1;

// =============================================================================
// Solid entry points
// =============================================================================

/// Write a solid entry point
pub fn encode_solid_entry_point<W: Write + ?Sized>(
    writer: &mut W,
    sep: &BlockId,
) -> SnapshotResult<()> {
    encode_array(writer, sep.as_bytes())
}

/// Read a solid entry point
pub fn decode_solid_entry_point<R: Read + ?Sized>(reader: &mut R) -> SnapshotResult<BlockId> {
    Ok(BlockId::from_bytes(decode_array(reader, "solid entry point")?))
}

// =============================================================================
// Outputs
// =============================================================================

/// Write an output
pub fn encode_output<W: Write + ?Sized>(writer: &mut W, output: &Output) -> SnapshotResult<()> {
    encode_array(writer, output.output_id.transaction_id.as_bytes())?;
    encode_u16(writer, output.output_id.index)?;
    encode_array(writer, output.block_id.as_bytes())?;
    encode_u32(writer, output.milestone_index_booked)?;
    encode_u32(writer, output.milestone_timestamp_booked)?;
    encode_array(writer, output.address.as_bytes())?;
    encode_u64(writer, output.amount)
}

/// Read an output
pub fn decode_output<R: Read + ?Sized>(reader: &mut R) -> SnapshotResult<Output> {
    let transaction_id = TransactionId::from_bytes(decode_array(reader, "output transaction id")?);
    let index = decode_u16(reader, "output index")?;
    let block_id = BlockId::from_bytes(decode_array(reader, "output block id")?);
    let milestone_index_booked = decode_u32(reader, "output milestone index")?;
    let milestone_timestamp_booked = decode_u32(reader, "output milestone timestamp")?;
    let address = Address::from_bytes(decode_array(reader, "output address")?);
    let amount = decode_u64(reader, "output amount")?;

    Ok(Output {
        output_id: OutputId::new(transaction_id, index),
        block_id,
        milestone_index_booked,
        milestone_timestamp_booked,
        address,
        amount,
    })
}

// =============================================================================
// Spent outputs
// =============================================================================

/// Write a spent record
pub fn encode_spent<W: Write + ?Sized>(writer: &mut W, spent: &Spent) -> SnapshotResult<()> {
    encode_output(writer, &spent.output)?;
    encode_array(writer, spent.transaction_id_spent.as_bytes())?;
    encode_u32(writer, spent.milestone_index_spent)?;
    encode_u32(writer, spent.milestone_timestamp_spent)
}

/// Read a spent record
pub fn decode_spent<R: Read + ?Sized>(reader: &mut R) -> SnapshotResult<Spent> {
    let output = decode_output(reader)?;
    let transaction_id_spent =
        TransactionId::from_bytes(decode_array(reader, "spending transaction id")?);
    let milestone_index_spent = decode_u32(reader, "spent milestone index")?;
    let milestone_timestamp_spent = decode_u32(reader, "spent milestone timestamp")?;

    Ok(Spent {
        output,
        transaction_id_spent,
        milestone_index_spent,
        milestone_timestamp_spent,
    })
}

// =============================================================================
// Treasury outputs
// =============================================================================

/// Write a treasury output
pub fn encode_treasury_output<W: Write + ?Sized>(
    writer: &mut W,
    output: &TreasuryOutput,
) -> SnapshotResult<()> {
    encode_array(writer, output.milestone_id.as_bytes())?;
    encode_u64(writer, output.amount)?;
    encode_flag(writer, output.spent)
}

/// Read a treasury output
pub fn decode_treasury_output<R: Read + ?Sized>(reader: &mut R) -> SnapshotResult<TreasuryOutput> {
    let milestone_id = MilestoneId::from_bytes(decode_array(reader, "treasury milestone id")?);
    let amount = decode_u64(reader, "treasury amount")?;
    let spent = decode_flag(reader, "treasury spent")?;

    Ok(TreasuryOutput {
        milestone_id,
        amount,
        spent,
    })
}

// =============================================================================
// Milestone diffs
// =============================================================================

/// Check a diff against the configured limits without writing anything
pub fn validate_milestone_diff(
    diff: &MilestoneDiff,
    config: &SnapshotConfig,
) -> SnapshotResult<()> {
    check_len(
        "milestone payload",
        diff.milestone.len() as u64,
        config.max_milestone_payload_len,
    )?;
    check_len(
        "created outputs",
        diff.created.len() as u64,
        config.max_diff_outputs,
    )?;
    check_len(
        "consumed outputs",
        diff.consumed.len() as u64,
        config.max_diff_outputs,
    )?;
    Ok(())
}

/// Write a milestone diff.
///
/// The diff is validated against `config` first, so a rejected diff leaves
/// no bytes behind.
pub fn encode_milestone_diff<W: Write + ?Sized>(
    writer: &mut W,
    diff: &MilestoneDiff,
    config: &SnapshotConfig,
) -> SnapshotResult<()> {
    validate_milestone_diff(diff, config)?;

    encode_u32(writer, diff.milestone_index)?;
    encode_bytes_with_len(
        writer,
        diff.milestone.as_bytes(),
        "milestone payload",
        config.max_milestone_payload_len,
    )?;

    encode_u32(writer, diff.created.len() as u32)?;
    for output in &diff.created {
        encode_output(writer, output)?;
    }

    encode_u32(writer, diff.consumed.len() as u32)?;
    for spent in &diff.consumed {
        encode_spent(writer, spent)?;
    }

    match &diff.spent_treasury_output {
        Some(treasury) => {
            encode_flag(writer, true)?;
            encode_treasury_output(writer, treasury)
        }
        None => encode_flag(writer, false),
    }
}

/// Read a milestone diff
pub fn decode_milestone_diff<R: Read + ?Sized>(
    reader: &mut R,
    config: &SnapshotConfig,
) -> SnapshotResult<MilestoneDiff> {
    let milestone_index = decode_u32(reader, "diff milestone index")?;
    let milestone = MilestonePayload::new(decode_bytes_with_len(
        reader,
        "milestone payload",
        config.max_milestone_payload_len,
    )?);

    let created_count = decode_u32(reader, "created outputs count")?;
    check_len("created outputs", created_count as u64, config.max_diff_outputs)?;
    // Capacity is bounded by the bytes actually read, not the declared count.
    let mut created = Vec::new();
    for _ in 0..created_count {
        created.push(decode_output(reader)?);
    }

    let consumed_count = decode_u32(reader, "consumed outputs count")?;
    check_len("consumed outputs", consumed_count as u64, config.max_diff_outputs)?;
    let mut consumed = Vec::new();
    for _ in 0..consumed_count {
        consumed.push(decode_spent(reader)?);
    }

    let spent_treasury_output = if decode_flag(reader, "diff treasury presence")? {
        Some(decode_treasury_output(reader)?)
    } else {
        None
    };

    Ok(MilestoneDiff {
        milestone_index,
        milestone,
        created,
        consumed,
        spent_treasury_output,
    })
}

/// Enforce strictly ascending milestone indices across a diff section
pub fn check_diff_order(
    previous: &mut Option<MilestoneIndex>,
    current: MilestoneIndex,
) -> SnapshotResult<()> {
    if let Some(prev) = *previous {
        if current <= prev {
            return Err(SnapshotError::DiffOutOfOrder {
                previous: prev,
                current,
            });
        }
    }
    *previous = Some(current);
    Ok(())
}
