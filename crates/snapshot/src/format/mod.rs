//! On-disk byte format of snapshot files.
//!
//! This module centralizes all encoding and decoding. The writer and reader
//! only decide *what* goes on the stream and in which order; the functions
//! here decide how each piece looks in bytes.
//!
//! # File Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header                                                       │
//! │   version u8 | type u8 | network_id u64                      │
//! │   sep_milestone_index u32 | ledger_milestone_index u32       │
//! │   [Full only] treasury: milestone_id [32] | amount u64 | u8  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Timestamp u32                                                │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Solid entry points  { 0x01 | block_id [32] }* 0x00           │
//! ├──────────────────────────────────────────────────────────────┤
//! │ [Full only] Outputs { 0x01 | output }* 0x00                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Milestone diffs     { 0x01 | diff }* 0x00                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Record counts are not stored anywhere: every record of a section is
//! preceded by [`RECORD_FOLLOWS`] and the section is closed by
//! [`SECTION_END`]. This lets the writer stream records from a producer
//! without knowing how many there will be and without seeking back.
//!
//! All integers are little-endian.
//!
//! # Module Structure
//!
//! - `primitives`: fixed-width integers, byte arrays, flags and markers
//! - `records`: solid entry points, outputs, spents, treasury outputs, diffs
//! - `header`: snapshot type and file header

pub mod header;
pub mod primitives;
pub mod records;

/// The only snapshot format version this build reads and writes
pub const SUPPORTED_FORMAT_VERSION: u8 = 2;

/// Marker preceding every record of a section
pub const RECORD_FOLLOWS: u8 = 0x01;

/// Marker closing a section
pub const SECTION_END: u8 = 0x00;

pub use header::{
    decode_header, encode_header, write_header, FileHeader, ReadFileHeader, SnapshotType,
};
pub use records::{
    check_diff_order, decode_milestone_diff, decode_output, decode_solid_entry_point, decode_spent,
    decode_treasury_output, encode_milestone_diff, encode_output, encode_solid_entry_point,
    encode_spent, encode_treasury_output, validate_milestone_diff, OUTPUT_ENCODED_LEN,
    SPENT_ENCODED_LEN, TREASURY_OUTPUT_ENCODED_LEN,
};
