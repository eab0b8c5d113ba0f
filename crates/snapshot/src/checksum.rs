//! Byte counting and CRC32 over a stream
//!
//! Wraps the sink or source of a snapshot stream so the writer and reader
//! can report how many bytes passed through and their checksum.

use crc32fast::Hasher;
use std::io::{self, Read, Write};

/// Writer adapter accumulating a byte count and CRC32 of everything written
pub struct ChecksumWriter<W> {
    inner: W,
    hasher: Hasher,
    bytes: u64,
}

impl<W: Write> ChecksumWriter<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        ChecksumWriter {
            inner,
            hasher: Hasher::new(),
            bytes: 0,
        }
    }

    /// Bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// CRC32 of the bytes written so far
    pub fn crc(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Access the wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader adapter accumulating a byte count and CRC32 of everything read
pub struct ChecksumReader<R> {
    inner: R,
    hasher: Hasher,
    bytes: u64,
}

impl<R: Read> ChecksumReader<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        ChecksumReader {
            inner,
            hasher: Hasher::new(),
            bytes: 0,
        }
    }

    /// Bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// CRC32 of the bytes read so far
    pub fn crc(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Unwrap the reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }
}
