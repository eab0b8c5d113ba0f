//! Snapshot configuration
//!
//! Limits applied while decoding untrusted snapshot files, buffer sizes for
//! file I/O, and the sync policy for crash-safe writes.

use serde::{Deserialize, Serialize};
use tangle_core::ConfigError;

/// Default maximum length of a milestone payload (32 KiB)
pub const DEFAULT_MAX_MILESTONE_PAYLOAD_LEN: u32 = 32 * 1024;

/// Default maximum number of created or consumed outputs in one diff
pub const DEFAULT_MAX_DIFF_OUTPUTS: u32 = 1024 * 1024;

/// Default I/O buffer capacity (64 KiB)
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Snapshot configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotConfig {
    /// Largest milestone payload accepted on write and read
    pub max_milestone_payload_len: u32,
    /// Largest created/consumed list accepted per milestone diff
    pub max_diff_outputs: u32,
    /// Capacity of the buffered reader/writer used for snapshot files
    pub buffer_capacity: usize,
    /// fsync the file and its directory when writing snapshot files
    pub sync_on_write: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            max_milestone_payload_len: DEFAULT_MAX_MILESTONE_PAYLOAD_LEN,
            max_diff_outputs: DEFAULT_MAX_DIFF_OUTPUTS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            sync_on_write: true,
        }
    }
}

impl SnapshotConfig {
    /// Create config for testing
    ///
    /// Uses small buffers and skips fsync.
    pub fn for_testing() -> Self {
        SnapshotConfig {
            buffer_capacity: 4 * 1024,
            sync_on_write: false,
            ..Default::default()
        }
    }

    /// Set the maximum milestone payload length
    pub fn with_max_milestone_payload_len(mut self, len: u32) -> Self {
        self.max_milestone_payload_len = len;
        self
    }

    /// Set the maximum number of outputs per diff list
    pub fn with_max_diff_outputs(mut self, count: u32) -> Self {
        self.max_diff_outputs = count;
        self
    }

    /// Set the I/O buffer capacity
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Enable or disable fsync on write
    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_milestone_payload_len == 0 {
            return Err(ConfigError::invalid_value(
                "maxMilestonePayloadLen",
                "must be greater than zero",
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "bufferCapacity",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
