//! Binary primitives
//!
//! Fixed-width little-endian integers, fixed-size byte arrays,
//! length-prefixed blobs, boolean flags and section markers.
//!
//! Every decode function takes a `what` label naming the field being read so
//! that a truncated stream reports which field ran out of bytes.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{SnapshotError, SnapshotResult};
use crate::format::{RECORD_FOLLOWS, SECTION_END};

/// Write a u8
pub fn encode_u8<W: Write + ?Sized>(writer: &mut W, value: u8) -> SnapshotResult<()> {
    writer.write_u8(value)?;
    Ok(())
}

/// Read a u8
pub fn decode_u8<R: Read + ?Sized>(reader: &mut R, what: &str) -> SnapshotResult<u8> {
    reader
        .read_u8()
        .map_err(|e| SnapshotError::from_read(e, what))
}

/// Write a little-endian u16
pub fn encode_u16<W: Write + ?Sized>(writer: &mut W, value: u16) -> SnapshotResult<()> {
    writer.write_u16::<LittleEndian>(value)?;
    Ok(())
}

/// Read a little-endian u16
pub fn decode_u16<R: Read + ?Sized>(reader: &mut R, what: &str) -> SnapshotResult<u16> {
    reader
        .read_u16::<LittleEndian>()
        .map_err(|e| SnapshotError::from_read(e, what))
}

/// Write a little-endian u32
pub fn encode_u32<W: Write + ?Sized>(writer: &mut W, value: u32) -> SnapshotResult<()> {
    writer.write_u32::<LittleEndian>(value)?;
    Ok(())
}

/// Read a little-endian u32
pub fn decode_u32<R: Read + ?Sized>(reader: &mut R, what: &str) -> SnapshotResult<u32> {
    reader
        .read_u32::<LittleEndian>()
        .map_err(|e| SnapshotError::from_read(e, what))
}

/// Write a little-endian u64
pub fn encode_u64<W: Write + ?Sized>(writer: &mut W, value: u64) -> SnapshotResult<()> {
    writer.write_u64::<LittleEndian>(value)?;
    Ok(())
}

/// Read a little-endian u64
pub fn decode_u64<R: Read + ?Sized>(reader: &mut R, what: &str) -> SnapshotResult<u64> {
    reader
        .read_u64::<LittleEndian>()
        .map_err(|e| SnapshotError::from_read(e, what))
}

/// Write raw bytes with no length prefix
pub fn encode_array<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> SnapshotResult<()> {
    writer.write_all(bytes)?;
    Ok(())
}

/// Read exactly `N` bytes
pub fn decode_array<R: Read + ?Sized, const N: usize>(
    reader: &mut R,
    what: &str,
) -> SnapshotResult<[u8; N]> {
    let mut buf = [0u8; N];
    reader
        .read_exact(&mut buf)
        .map_err(|e| SnapshotError::from_read(e, what))?;
    Ok(buf)
}

/// Write a u32 length prefix followed by the bytes.
///
/// Fails with `LengthLimitExceeded` before writing anything if the blob is
/// longer than `max`.
pub fn encode_bytes_with_len<W: Write + ?Sized>(
    writer: &mut W,
    bytes: &[u8],
    field: &'static str,
    max: u32,
) -> SnapshotResult<()> {
    let len = check_len(field, bytes.len() as u64, max)?;
    encode_u32(writer, len)?;
    encode_array(writer, bytes)
}

/// Read a u32 length prefix and that many bytes.
///
/// The length is checked against `max` before any allocation, and the
/// buffer grows with the data actually read, so a corrupt length cannot
/// trigger a huge allocation.
pub fn decode_bytes_with_len<R: Read + ?Sized>(
    reader: &mut R,
    field: &'static str,
    max: u32,
) -> SnapshotResult<Vec<u8>> {
    let len = decode_u32(reader, field)?;
    check_len(field, len as u64, max)?;

    let mut buf = Vec::new();
    reader
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(|e| SnapshotError::from_read(e, field))?;
    if buf.len() != len as usize {
        return Err(SnapshotError::malformed(format!(
            "unexpected end of stream while reading {}: expected {} bytes, got {}",
            field,
            len,
            buf.len()
        )));
    }
    Ok(buf)
}

/// Check a length against its maximum, returning it as u32
pub fn check_len(field: &'static str, len: u64, max: u32) -> SnapshotResult<u32> {
    if len > max as u64 {
        return Err(SnapshotError::LengthLimitExceeded {
            field,
            len,
            max: max as u64,
        });
    }
    Ok(len as u32)
}

/// Write a boolean flag as 0 or 1
pub fn encode_flag<W: Write + ?Sized>(writer: &mut W, flag: bool) -> SnapshotResult<()> {
    encode_u8(writer, flag as u8)
}

/// Read a boolean flag; anything other than 0 or 1 is malformed
pub fn decode_flag<R: Read + ?Sized>(reader: &mut R, what: &str) -> SnapshotResult<bool> {
    match decode_u8(reader, what)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(SnapshotError::malformed(format!(
            "invalid {} flag: {:#04x}",
            what, other
        ))),
    }
}

/// Write a section marker: `true` for "record follows", `false` for "end"
pub fn encode_marker<W: Write + ?Sized>(
    writer: &mut W,
    record_follows: bool,
) -> SnapshotResult<()> {
    encode_u8(
        writer,
        if record_follows {
            RECORD_FOLLOWS
        } else {
            SECTION_END
        },
    )
}

/// Read a section marker; returns `true` if a record follows
pub fn decode_marker<R: Read + ?Sized>(reader: &mut R, section: &str) -> SnapshotResult<bool> {
    match decode_u8(reader, section)? {
        RECORD_FOLLOWS => Ok(true),
        SECTION_END => Ok(false),
        other => Err(SnapshotError::malformed(format!(
            "invalid record marker {:#04x} in {} section",
            other, section
        ))),
    }
}
