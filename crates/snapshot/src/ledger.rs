//! In-memory reference ledger
//!
//! A UTXO ledger kept entirely in memory behind a `parking_lot::RwLock`. It
//! plugs into both ends of the snapshot engine:
//!
//! - As a source: [`MemoryLedger::read_lock`] returns a guard that blocks
//!   ledger mutation while it lives, and the guard hands out producers over
//!   its unspent outputs, solid entry points and milestone diffs.
//! - As a target: [`LedgerLoader`] implements [`SnapshotConsumer`] and
//!   rebuilds the ledger from a snapshot stream.
//!
//! Loads are staged and only committed from `on_complete`, so a snapshot
//! that fails halfway leaves the ledger as it was.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::{RwLock, RwLockReadGuard};
use thiserror::Error;
use tracing::info;

use tangle_core::{
    Address, BlockId, MilestoneIndex, NetworkId, Output, OutputId, Spent, TreasuryOutput,
};

use crate::consumer::{
    MilestoneDiffConsumer, OutputConsumer, SnapshotConsumer, SolidEntryPointConsumer,
    TreasuryOutputConsumer,
};
use crate::error::{CallbackError, SnapshotError, SnapshotResult};
use crate::format::header::{FileHeader, ReadFileHeader, SnapshotType};
use crate::producer::{from_iter, RecordProducer};
use crate::types::{MilestoneDiff, ReadSummary};

/// Errors raised while mutating the ledger
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A diff consumes an output that is not unspent
    #[error("Output {0} is not unspent")]
    UnknownOutput(OutputId),

    /// An output is created twice
    #[error("Output {0} already exists")]
    DuplicateOutput(OutputId),

    /// A diff consumes the same output more than once
    #[error("Output {0} is consumed twice in one milestone")]
    DoubleSpend(OutputId),

    /// A delta snapshot was loaded into a ledger without a base state
    #[error("Delta snapshot requires a loaded base ledger")]
    MissingBase,

    /// A delta snapshot ends before the base ledger
    #[error("Delta snapshot at ledger index {delta} is older than base ledger index {base}")]
    StaleDelta {
        /// Ledger index of the base
        base: MilestoneIndex,
        /// Ledger index announced by the delta header
        delta: MilestoneIndex,
    },

    /// After applying all diffs the ledger index differs from the header
    #[error("Ledger index mismatch: header announced {expected}, diffs reached {actual}")]
    LedgerIndexMismatch {
        /// Ledger index from the snapshot header
        expected: MilestoneIndex,
        /// Ledger index after the last diff
        actual: MilestoneIndex,
    },

    /// A record arrived before the header
    #[error("Snapshot record received before header")]
    HeaderMissing,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    unspent: BTreeMap<OutputId, Output>,
    spent: BTreeMap<OutputId, Spent>,
    solid_entry_points: Vec<BlockId>,
    treasury_output: Option<TreasuryOutput>,
    milestone_diffs: BTreeMap<MilestoneIndex, MilestoneDiff>,
    sep_milestone_index: MilestoneIndex,
    ledger_milestone_index: MilestoneIndex,
    loaded: bool,
}

impl LedgerState {
    fn insert_unspent(&mut self, output: Output) -> Result<(), LedgerError> {
        let id = output.output_id;
        if self.unspent.contains_key(&id) || self.spent.contains_key(&id) {
            return Err(LedgerError::DuplicateOutput(id));
        }
        self.unspent.insert(id, output);
        Ok(())
    }

    /// Apply a diff newer than the ledger index; older diffs are kept as
    /// history only.
    fn apply_milestone_diff(&mut self, diff: MilestoneDiff) -> Result<(), LedgerError> {
        if diff.milestone_index > self.ledger_milestone_index {
            self.check_milestone_diff(&diff)?;
            for output in &diff.created {
                self.unspent.insert(output.output_id, output.clone());
            }
            for spent in &diff.consumed {
                let id = spent.output_id();
                self.unspent.remove(&id);
                self.spent.insert(id, spent.clone());
            }
            if let Some(spent_treasury) = diff.spent_treasury_output {
                let current = self.treasury_output.map(|t| t.milestone_id);
                if current == Some(spent_treasury.milestone_id) {
                    self.treasury_output = None;
                }
            }
            self.ledger_milestone_index = diff.milestone_index;
        }
        self.milestone_diffs.insert(diff.milestone_index, diff);
        Ok(())
    }

    fn check_milestone_diff(&self, diff: &MilestoneDiff) -> Result<(), LedgerError> {
        let mut created = BTreeSet::new();
        for output in &diff.created {
            let id = output.output_id;
            let known = self.unspent.contains_key(&id) || self.spent.contains_key(&id);
            if known || !created.insert(id) {
                return Err(LedgerError::DuplicateOutput(id));
            }
        }
        let mut consumed = BTreeSet::new();
        for spent in &diff.consumed {
            let id = spent.output_id();
            if !created.contains(&id) && !self.unspent.contains_key(&id) {
                return Err(LedgerError::UnknownOutput(id));
            }
            if !consumed.insert(id) {
                return Err(LedgerError::DoubleSpend(id));
            }
        }
        Ok(())
    }
}

/// In-memory UTXO ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the ledger for reading.
    ///
    /// All mutation blocks until the guard is dropped, which makes the
    /// guard's producers safe to stream from.
    pub fn read_lock(&self) -> LedgerReadGuard<'_> {
        LedgerReadGuard {
            state: self.state.read(),
        }
    }

    /// Loader that replaces this ledger's state with a snapshot
    pub fn loader(&self) -> LedgerLoader<'_> {
        LedgerLoader::new(self)
    }

    /// Set the SEP and ledger milestone indices
    pub fn set_milestone_indices(&self, sep: MilestoneIndex, ledger: MilestoneIndex) {
        let mut state = self.state.write();
        state.sep_milestone_index = sep;
        state.ledger_milestone_index = ledger;
        state.loaded = true;
    }

    /// Add an unspent output
    pub fn insert_unspent(&self, output: Output) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.loaded = true;
        state.insert_unspent(output)
    }

    /// Add a solid entry point
    pub fn add_solid_entry_point(&self, sep: BlockId) {
        self.state.write().solid_entry_points.push(sep);
    }

    /// Replace the unspent treasury output
    pub fn set_treasury_output(&self, output: TreasuryOutput) {
        self.state.write().treasury_output = Some(output);
    }

    /// Apply a milestone diff.
    ///
    /// A diff above the ledger index moves created outputs into the unspent
    /// set and consumed outputs into the spent set, then advances the ledger
    /// index. A spent treasury output matching the ledger's unspent one
    /// removes it. The diff is rejected as a whole if any consumed output is
    /// unknown or listed twice, or any created output already exists or is
    /// listed twice.
    pub fn apply_milestone_diff(&self, diff: MilestoneDiff) -> Result<(), LedgerError> {
        self.state.write().apply_milestone_diff(diff)
    }

    /// Ledger milestone index
    pub fn ledger_milestone_index(&self) -> MilestoneIndex {
        self.state.read().ledger_milestone_index
    }

    /// SEP milestone index
    pub fn sep_milestone_index(&self) -> MilestoneIndex {
        self.state.read().sep_milestone_index
    }

    /// Ids of every known output, unspent or spent, in ascending order
    pub fn output_ids(&self) -> Vec<OutputId> {
        let state = self.state.read();
        let mut ids: Vec<OutputId> = state
            .unspent
            .keys()
            .chain(state.spent.keys())
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Ids of the unspent outputs in ascending order
    pub fn unspent_output_ids(&self) -> Vec<OutputId> {
        self.state.read().unspent.keys().copied().collect()
    }

    /// Ids of the spent outputs in ascending order
    pub fn spent_output_ids(&self) -> Vec<OutputId> {
        self.state.read().spent.keys().copied().collect()
    }

    /// Sum of unspent amounts per address
    ///
    /// Amounts come from untrusted snapshots, so sums are widened to `u128`.
    pub fn balances_by_address(&self) -> BTreeMap<Address, u128> {
        let state = self.state.read();
        let mut balances = BTreeMap::new();
        for output in state.unspent.values() {
            *balances.entry(output.address).or_insert(0u128) += u128::from(output.amount);
        }
        balances
    }

    /// Stored diff for a milestone
    pub fn milestone_diff(&self, index: MilestoneIndex) -> Option<MilestoneDiff> {
        self.state.read().milestone_diffs.get(&index).cloned()
    }
}

/// Read access to a [`MemoryLedger`] that holds off mutation while alive
pub struct LedgerReadGuard<'a> {
    state: RwLockReadGuard<'a, LedgerState>,
}

impl<'a> LedgerReadGuard<'a> {
    /// Ledger milestone index
    pub fn ledger_milestone_index(&self) -> MilestoneIndex {
        self.state.ledger_milestone_index
    }

    /// SEP milestone index
    pub fn sep_milestone_index(&self) -> MilestoneIndex {
        self.state.sep_milestone_index
    }

    /// Unspent treasury output
    pub fn treasury_output(&self) -> Option<TreasuryOutput> {
        self.state.treasury_output
    }

    /// Number of unspent outputs
    pub fn unspent_count(&self) -> usize {
        self.state.unspent.len()
    }

    /// Producer over all unspent outputs in output id order
    pub fn unspent_outputs_producer(&self) -> impl RecordProducer<Output> + '_ {
        from_iter(self.state.unspent.values().cloned())
    }

    /// Producer over the solid entry points in insertion order
    pub fn solid_entry_points_producer(&self) -> impl RecordProducer<BlockId> + '_ {
        from_iter(self.state.solid_entry_points.iter().copied())
    }

    /// Producer over stored diffs from milestone `from` onwards, ascending
    pub fn milestone_diffs_producer(
        &self,
        from: MilestoneIndex,
    ) -> impl RecordProducer<MilestoneDiff> + '_ {
        from_iter(self.state.milestone_diffs.range(from..).map(|(_, diff)| diff.clone()))
    }

    /// Full snapshot header for the current state
    pub fn full_header(&self, network_id: NetworkId) -> SnapshotResult<FileHeader> {
        let treasury = self.state.treasury_output.ok_or_else(|| {
            SnapshotError::invalid_header("ledger has no unspent treasury output")
        })?;
        let header = FileHeader::full(
            network_id,
            self.state.sep_milestone_index,
            self.state.ledger_milestone_index,
            treasury,
        );
        header.validate()?;
        Ok(header)
    }

    /// Delta snapshot header for the current state
    pub fn delta_header(&self, network_id: NetworkId) -> FileHeader {
        FileHeader::delta(
            network_id,
            self.state.sep_milestone_index,
            self.state.ledger_milestone_index,
        )
    }
}

/// Rebuilds a [`MemoryLedger`] from a snapshot stream.
///
/// A full snapshot replaces the whole ledger. A delta snapshot replaces the
/// solid entry points and applies its diffs on top of the current state.
/// Nothing is visible in the ledger until the stream completes.
pub struct LedgerLoader<'a> {
    ledger: &'a MemoryLedger,
    header: Option<FileHeader>,
    staging: LedgerState,
}

impl<'a> LedgerLoader<'a> {
    /// Create a loader targeting `ledger`
    pub fn new(ledger: &'a MemoryLedger) -> Self {
        LedgerLoader {
            ledger,
            header: None,
            staging: LedgerState::default(),
        }
    }

    fn ensure_header(&self) -> Result<(), CallbackError> {
        if self.header.is_none() {
            return Err(LedgerError::HeaderMissing.into());
        }
        Ok(())
    }
}

impl SolidEntryPointConsumer for LedgerLoader<'_> {
    fn on_solid_entry_point(&mut self, sep: BlockId) -> Result<(), CallbackError> {
        self.ensure_header()?;
        self.staging.solid_entry_points.push(sep);
        Ok(())
    }
}

impl OutputConsumer for LedgerLoader<'_> {
    fn on_output(&mut self, output: Output) -> Result<(), CallbackError> {
        self.ensure_header()?;
        self.staging.insert_unspent(output)?;
        Ok(())
    }
}

impl TreasuryOutputConsumer for LedgerLoader<'_> {
    fn on_unspent_treasury_output(&mut self, output: TreasuryOutput) -> Result<(), CallbackError> {
        self.ensure_header()?;
        self.staging.treasury_output = Some(output);
        Ok(())
    }
}

impl MilestoneDiffConsumer for LedgerLoader<'_> {
    fn on_milestone_diff(&mut self, diff: MilestoneDiff) -> Result<(), CallbackError> {
        self.ensure_header()?;
        self.staging.apply_milestone_diff(diff)?;
        Ok(())
    }
}

impl SnapshotConsumer for LedgerLoader<'_> {
    fn on_header(&mut self, read: &ReadFileHeader) -> Result<(), CallbackError> {
        let header = read.header;
        self.staging = match header.snapshot_type {
            SnapshotType::Full => LedgerState {
                sep_milestone_index: header.sep_milestone_index,
                ledger_milestone_index: header.ledger_milestone_index,
                ..LedgerState::default()
            },
            SnapshotType::Delta => {
                let base = self.ledger.state.read();
                if !base.loaded {
                    return Err(LedgerError::MissingBase.into());
                }
                if base.ledger_milestone_index > header.ledger_milestone_index {
                    return Err(LedgerError::StaleDelta {
                        base: base.ledger_milestone_index,
                        delta: header.ledger_milestone_index,
                    }
                    .into());
                }
                let mut staging = base.clone();
                staging.solid_entry_points.clear();
                staging.sep_milestone_index = header.sep_milestone_index;
                staging
            }
        };
        self.staging.loaded = true;
        self.header = Some(header);
        Ok(())
    }

    fn on_complete(&mut self, summary: &ReadSummary) -> Result<(), CallbackError> {
        let header = summary.header.header;
        if self.staging.ledger_milestone_index != header.ledger_milestone_index {
            return Err(LedgerError::LedgerIndexMismatch {
                expected: header.ledger_milestone_index,
                actual: self.staging.ledger_milestone_index,
            }
            .into());
        }

        let staging = std::mem::take(&mut self.staging);
        let unspent = staging.unspent.len();
        *self.ledger.state.write() = staging;
        self.header = None;

        info!(
            target: "tangle::ledger",
            snapshot_type = %header.snapshot_type,
            ledger_milestone_index = header.ledger_milestone_index,
            unspent,
            "Ledger loaded from snapshot"
        );
        Ok(())
    }
}
