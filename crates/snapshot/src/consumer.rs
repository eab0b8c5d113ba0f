//! Read-side record consumers
//!
//! The reader pushes every decoded record into a consumer, one callback per
//! record kind. Returning an error from any callback aborts the read; the
//! error comes back tagged with the section that was being read.

use tangle_core::{BlockId, Output, TreasuryOutput};

use crate::error::CallbackError;
use crate::format::header::ReadFileHeader;
use crate::types::{MilestoneDiff, ReadSummary};

/// Callback invoked for each solid entry point
pub trait SolidEntryPointConsumer {
    /// Called once per solid entry point, in file order
    fn on_solid_entry_point(&mut self, sep: BlockId) -> Result<(), CallbackError>;
}

/// Callback invoked for each unspent output (full snapshots only)
pub trait OutputConsumer {
    /// Called once per output, in file order
    fn on_output(&mut self, output: Output) -> Result<(), CallbackError>;
}

/// Callback invoked with the unspent treasury output (full snapshots only)
pub trait TreasuryOutputConsumer {
    /// Called exactly once, after the last output
    fn on_unspent_treasury_output(&mut self, output: TreasuryOutput) -> Result<(), CallbackError>;
}

/// Callback invoked for each milestone diff
pub trait MilestoneDiffConsumer {
    /// Called once per diff, in ascending milestone index order
    fn on_milestone_diff(&mut self, diff: MilestoneDiff) -> Result<(), CallbackError>;
}

/// Combined consumer for everything in a snapshot file
pub trait SnapshotConsumer:
    SolidEntryPointConsumer + OutputConsumer + TreasuryOutputConsumer + MilestoneDiffConsumer
{
    /// Called after the header and timestamp are decoded and accepted,
    /// before any section is read
    fn on_header(&mut self, header: &ReadFileHeader) -> Result<(), CallbackError>;

    /// Called after the last section was read successfully
    fn on_complete(&mut self, _summary: &ReadSummary) -> Result<(), CallbackError> {
        Ok(())
    }
}

/// Consumer that collects every record in memory.
///
/// Only suitable for small snapshots and tests.
#[derive(Debug, Default)]
pub struct CollectingConsumer {
    /// Header and timestamp
    pub header: Option<ReadFileHeader>,
    /// Solid entry points
    pub solid_entry_points: Vec<BlockId>,
    /// Unspent outputs
    pub outputs: Vec<Output>,
    /// Unspent treasury output
    pub treasury_output: Option<TreasuryOutput>,
    /// Milestone diffs
    pub milestone_diffs: Vec<MilestoneDiff>,
    /// Summary reported on completion
    pub summary: Option<ReadSummary>,
}

impl SolidEntryPointConsumer for CollectingConsumer {
    fn on_solid_entry_point(&mut self, sep: BlockId) -> Result<(), CallbackError> {
        self.solid_entry_points.push(sep);
        Ok(())
    }
}

impl OutputConsumer for CollectingConsumer {
    fn on_output(&mut self, output: Output) -> Result<(), CallbackError> {
        self.outputs.push(output);
        Ok(())
    }
}

impl TreasuryOutputConsumer for CollectingConsumer {
    fn on_unspent_treasury_output(&mut self, output: TreasuryOutput) -> Result<(), CallbackError> {
        self.treasury_output = Some(output);
        Ok(())
    }
}

impl MilestoneDiffConsumer for CollectingConsumer {
    fn on_milestone_diff(&mut self, diff: MilestoneDiff) -> Result<(), CallbackError> {
        self.milestone_diffs.push(diff);
        Ok(())
    }
}

impl SnapshotConsumer for CollectingConsumer {
    fn on_header(&mut self, header: &ReadFileHeader) -> Result<(), CallbackError> {
        self.header = Some(header.clone());
        Ok(())
    }

    fn on_complete(&mut self, summary: &ReadSummary) -> Result<(), CallbackError> {
        self.summary = Some(summary.clone());
        Ok(())
    }
}
