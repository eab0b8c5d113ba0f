//! Identifier types for the tangle ledger
//!
//! This module defines the fixed-size identifiers used throughout the node:
//! - BlockId: Hash of a block in the tangle
//! - MilestoneId: Hash of a milestone payload
//! - TransactionId: Hash of a transaction payload
//! - Address: Ed25519 address hash owning an output
//! - OutputId: Transaction id plus output index
//!
//! All identifiers are plain byte arrays. Their on-disk encoding is the raw
//! bytes, in order, with no length prefix.

use std::fmt;

/// Milestone index (monotonically increasing consensus checkpoint number)
pub type MilestoneIndex = u32;

/// Milestone timestamp (seconds since the Unix epoch)
pub type MilestoneTimestamp = u32;

/// 64-bit identity distinguishing ledger networks
pub type NetworkId = u64;

/// Lowercase hex encoding prefixed with `0x`
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the identifier in bytes
            pub const LENGTH: usize = $len;

            /// Create an identifier from raw bytes
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// The all-zero identifier
            pub const fn empty() -> Self {
                Self([0u8; $len])
            }

            /// Get the raw bytes of this identifier
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Check whether this is the all-zero identifier
            pub fn is_empty(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Hex representation (`0x` prefixed)
            pub fn to_hex(&self) -> String {
                to_hex(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::empty()
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

hash_id!(
    /// Identifier of a block in the tangle
    BlockId,
    32
);

hash_id!(
    /// Identifier of a milestone payload
    MilestoneId,
    32
);

hash_id!(
    /// Identifier of a transaction payload
    TransactionId,
    32
);

hash_id!(
    /// Ed25519 address (Blake2b-256 hash of the public key)
    Address,
    32
);

/// Identifier of a transaction output: the creating transaction plus the
/// index of the output within that transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct OutputId {
    /// Transaction that created the output
    pub transaction_id: TransactionId,
    /// Index of the output within the transaction
    pub index: u16,
}

impl OutputId {
    /// Serialized length: transaction id (32) + index (2)
    pub const LENGTH: usize = TransactionId::LENGTH + 2;

    /// Create a new output id
    pub fn new(transaction_id: TransactionId, index: u16) -> Self {
        Self {
            transaction_id,
            index,
        }
    }

    /// Raw bytes: transaction id followed by the little-endian index
    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let mut bytes = [0u8; Self::LENGTH];
        bytes[..TransactionId::LENGTH].copy_from_slice(self.transaction_id.as_bytes());
        bytes[TransactionId::LENGTH..].copy_from_slice(&self.index.to_le_bytes());
        bytes
    }

    /// Hex representation of [`OutputId::to_bytes`]
    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.to_hex())
    }
}
