//! Snapshot error types

use std::fmt;
use std::io;
use thiserror::Error;

/// Error type returned by producers and consumers.
///
/// The engine never inspects it; it is carried verbatim inside
/// [`SnapshotError::Producer`] / [`SnapshotError::Consumer`].
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Section of a snapshot file being processed when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// File header and write timestamp
    Header,
    /// Solid entry points
    SolidEntryPoints,
    /// Unspent outputs (full snapshots only)
    Outputs,
    /// Unspent treasury output (full snapshots only)
    TreasuryOutput,
    /// Milestone diffs
    MilestoneDiffs,
}

impl Section {
    /// Human readable section name
    pub fn name(&self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::SolidEntryPoints => "solid entry points",
            Section::Outputs => "outputs",
            Section::TreasuryOutput => "treasury output",
            Section::MilestoneDiffs => "milestone diffs",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur while writing or reading a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O error other than a premature end of stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Truncated or structurally invalid data
    #[error("Malformed snapshot data: {0}")]
    MalformedData(String),

    /// Format version byte does not match the supported version
    #[error("Unsupported snapshot format version: {version} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the file
        version: u8,
        /// The only version this build reads and writes
        supported: u8,
    },

    /// Snapshot belongs to a different ledger network
    #[error("Network mismatch: expected network id {expected}, snapshot has {actual}")]
    NetworkMismatch {
        /// Network id derived from the node's protocol parameters
        expected: u64,
        /// Network id stored in the snapshot
        actual: u64,
    },

    /// Unknown snapshot type tag
    #[error("Invalid snapshot type: {0}")]
    InvalidSnapshotType(u8),

    /// Header fields violate a header invariant
    #[error("Invalid snapshot header: {0}")]
    InvalidHeader(String),

    /// A length or count exceeds its configured maximum
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthLimitExceeded {
        /// Field whose length was checked
        field: &'static str,
        /// Length found
        len: u64,
        /// Configured maximum
        max: u64,
    },

    /// Milestone diffs are not in strictly ascending index order
    #[error("Milestone diff out of order: index {current} follows {previous}")]
    DiffOutOfOrder {
        /// Index of the preceding diff
        previous: u32,
        /// Index of the offending diff
        current: u32,
    },

    /// A write-side producer failed
    #[error("Producer failed in {section} section: {source}")]
    Producer {
        /// Section being written
        section: Section,
        /// Error returned by the producer
        source: CallbackError,
    },

    /// A read-side consumer failed
    #[error("Consumer failed in {section} section: {source}")]
    Consumer {
        /// Section being read
        section: Section,
        /// Error returned by the consumer
        source: CallbackError,
    },
}

impl SnapshotError {
    /// Create a malformed data error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }

    /// Create an invalid header error
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    /// Map a read failure: a premature end of stream is malformed data,
    /// anything else stays an I/O error.
    pub fn from_read(err: io::Error, what: &str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::MalformedData(format!("unexpected end of stream while reading {}", what))
        } else {
            Self::Io(err)
        }
    }

    /// The file was written for another network or format version
    pub fn is_protocol_incompatibility(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion { .. } | Self::NetworkMismatch { .. }
        )
    }

    /// The file is truncated or structurally invalid
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::MalformedData(_)
                | Self::InvalidSnapshotType(_)
                | Self::InvalidHeader(_)
                | Self::LengthLimitExceeded { .. }
                | Self::DiffOutOfOrder { .. }
        )
    }

    /// A caller-supplied producer or consumer aborted the stream
    pub fn is_callback_failure(&self) -> bool {
        matches!(self, Self::Producer { .. } | Self::Consumer { .. })
    }

    /// Section in which a callback failed
    pub fn section(&self) -> Option<Section> {
        match self {
            Self::Producer { section, .. } | Self::Consumer { section, .. } => Some(*section),
            _ => None,
        }
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SnapshotError::UnsupportedVersion {
            version: 9,
            supported: 2,
        };
        assert!(err.to_string().contains('9'));
        assert!(err.to_string().contains('2'));

        let err = SnapshotError::NetworkMismatch {
            expected: 1,
            actual: 1337,
        };
        assert!(err.to_string().contains("1337"));

        let err = SnapshotError::Consumer {
            section: Section::Outputs,
            source: "ledger full".into(),
        };
        assert!(err.to_string().contains("outputs"));
        assert!(err.to_string().contains("ledger full"));
    }

    #[test]
    fn test_unexpected_eof_is_malformed() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let err = SnapshotError::from_read(io_err, "block id");
        assert!(matches!(err, SnapshotError::MalformedData(ref m) if m.contains("block id")));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_other_io_stays_io() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = SnapshotError::from_read(io_err, "header");
        assert!(matches!(err, SnapshotError::Io(_)));
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_classification() {
        assert!(SnapshotError::NetworkMismatch {
            expected: 1,
            actual: 2
        }
        .is_protocol_incompatibility());
        assert!(SnapshotError::DiffOutOfOrder {
            previous: 5,
            current: 5
        }
        .is_corruption());

        let err = SnapshotError::Producer {
            section: Section::SolidEntryPoints,
            source: "boom".into(),
        };
        assert!(err.is_callback_failure());
        assert_eq!(err.section(), Some(Section::SolidEntryPoints));
        assert_eq!(SnapshotError::malformed("x").section(), None);
    }

    #[test]
    fn test_callback_source_is_preserved() {
        let err = SnapshotError::Consumer {
            section: Section::MilestoneDiffs,
            source: Box::new(io::Error::new(io::ErrorKind::Other, "inner")),
        };
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "inner");
    }
}
