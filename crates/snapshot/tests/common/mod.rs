//! Shared generators and consumers for snapshot integration tests
//!
//! Records are generated from seeded RNGs so a consumer can regenerate the
//! expected sequence in lockstep instead of keeping every written record.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use tangle_core::{
    Address, BlockId, MilestoneId, MilestoneIndex, Output, OutputId, ProtocolParameters, Spent,
    TransactionId, TreasuryOutput,
};
use tangle_snapshot::{
    CallbackError, MilestoneDiff, MilestoneDiffConsumer, MilestonePayload, OutputConsumer,
    ReadFileHeader, ReadSummary, RecordProducer, SnapshotConsumer, SolidEntryPointConsumer,
    TreasuryOutputConsumer,
};

pub const SEP_SEED: u64 = 0x5e9;
pub const OUTPUT_SEED: u64 = 0x0070;
pub const DIFF_SEED: u64 = 0xd1ff;

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn params() -> ProtocolParameters {
    ProtocolParameters::new("snapshot-tests")
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn rand_32(rng: &mut StdRng) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    bytes
}

pub fn rand_block_id(rng: &mut StdRng) -> BlockId {
    BlockId::from_bytes(rand_32(rng))
}

pub fn rand_milestone_id(rng: &mut StdRng) -> MilestoneId {
    MilestoneId::from_bytes(rand_32(rng))
}

pub fn rand_output(rng: &mut StdRng) -> Output {
    Output::new(
        OutputId::new(TransactionId::from_bytes(rand_32(rng)), rng.gen_range(0..128)),
        BlockId::from_bytes(rand_32(rng)),
        rng.gen(),
        rng.gen(),
        Address::from_bytes(rand_32(rng)),
        rng.gen_range(1..1_000_000_000),
    )
}

pub fn rand_spent(rng: &mut StdRng, milestone_index: MilestoneIndex) -> Spent {
    let output = rand_output(rng);
    Spent::new(
        output,
        TransactionId::from_bytes(rand_32(rng)),
        milestone_index,
        rng.gen(),
    )
}

pub fn rand_treasury_output(rng: &mut StdRng, spent: bool) -> TreasuryOutput {
    TreasuryOutput {
        milestone_id: rand_milestone_id(rng),
        amount: rng.gen(),
        spent,
    }
}

pub fn rand_milestone_diff(rng: &mut StdRng, milestone_index: MilestoneIndex) -> MilestoneDiff {
    let mut payload = vec![0u8; rng.gen_range(32..256)];
    rng.fill_bytes(&mut payload);

    let created = (0..rng.gen_range(0..8)).map(|_| rand_output(rng)).collect();
    let consumed = (0..rng.gen_range(0..8))
        .map(|_| rand_spent(rng, milestone_index))
        .collect();

    let diff = MilestoneDiff::new(milestone_index, MilestonePayload::new(payload))
        .with_created(created)
        .with_consumed(consumed);
    if rng.gen_bool(0.5) {
        diff.with_spent_treasury_output(rand_treasury_output(rng, true))
    } else {
        diff
    }
}

/// Deterministic generator of a fixed number of records
pub struct Seeded<T> {
    rng: StdRng,
    remaining: u64,
    generate: fn(&mut StdRng) -> T,
}

impl<T> Seeded<T> {
    pub fn new(seed: u64, count: u64, generate: fn(&mut StdRng) -> T) -> Self {
        Seeded {
            rng: rng(seed),
            remaining: count,
            generate,
        }
    }

    /// Next record, or `None` once `count` records were produced
    pub fn next_record(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some((self.generate)(&mut self.rng))
    }
}

impl<T> RecordProducer<T> for Seeded<T> {
    fn next(&mut self) -> Result<Option<T>, CallbackError> {
        Ok(self.next_record())
    }
}

pub fn seps(count: u64) -> Seeded<BlockId> {
    Seeded::new(SEP_SEED, count, rand_block_id)
}

pub fn outputs(count: u64) -> Seeded<Output> {
    Seeded::new(OUTPUT_SEED, count, rand_output)
}

/// Deterministic diffs for consecutive milestone indices
pub struct SeededDiffs {
    rng: StdRng,
    next_index: MilestoneIndex,
    end_index: MilestoneIndex,
}

impl SeededDiffs {
    /// Diffs for milestones `first..=last`
    pub fn new(first: MilestoneIndex, last: MilestoneIndex) -> Self {
        SeededDiffs {
            rng: rng(DIFF_SEED),
            next_index: first,
            end_index: last,
        }
    }

    pub fn next_record(&mut self) -> Option<MilestoneDiff> {
        if self.next_index > self.end_index {
            return None;
        }
        let diff = rand_milestone_diff(&mut self.rng, self.next_index);
        self.next_index += 1;
        Some(diff)
    }
}

impl RecordProducer<MilestoneDiff> for SeededDiffs {
    fn next(&mut self) -> Result<Option<MilestoneDiff>, CallbackError> {
        Ok(self.next_record())
    }
}

/// Consumer that checks every record against regenerated expectations
/// without storing them
pub struct LockstepConsumer {
    pub expected_seps: Seeded<BlockId>,
    pub expected_outputs: Seeded<Output>,
    pub expected_diffs: SeededDiffs,
    pub header: Option<ReadFileHeader>,
    pub treasury: Option<TreasuryOutput>,
    pub treasury_calls: u32,
    pub seps_seen: u64,
    pub outputs_seen: u64,
    pub diffs_seen: u64,
    pub completed: bool,
}

impl LockstepConsumer {
    pub fn new(seps: Seeded<BlockId>, outputs: Seeded<Output>, diffs: SeededDiffs) -> Self {
        LockstepConsumer {
            expected_seps: seps,
            expected_outputs: outputs,
            expected_diffs: diffs,
            header: None,
            treasury: None,
            treasury_calls: 0,
            seps_seen: 0,
            outputs_seen: 0,
            diffs_seen: 0,
            completed: false,
        }
    }
}

fn mismatch(kind: &str, position: u64) -> CallbackError {
    format!("{} #{} differs from the written record", kind, position).into()
}

impl SolidEntryPointConsumer for LockstepConsumer {
    fn on_solid_entry_point(&mut self, sep: BlockId) -> Result<(), CallbackError> {
        if self.expected_seps.next_record() != Some(sep) {
            return Err(mismatch("solid entry point", self.seps_seen));
        }
        self.seps_seen += 1;
        Ok(())
    }
}

impl OutputConsumer for LockstepConsumer {
    fn on_output(&mut self, output: Output) -> Result<(), CallbackError> {
        if self.expected_outputs.next_record().as_ref() != Some(&output) {
            return Err(mismatch("output", self.outputs_seen));
        }
        self.outputs_seen += 1;
        Ok(())
    }
}

impl TreasuryOutputConsumer for LockstepConsumer {
    fn on_unspent_treasury_output(&mut self, output: TreasuryOutput) -> Result<(), CallbackError> {
        self.treasury = Some(output);
        self.treasury_calls += 1;
        Ok(())
    }
}

impl MilestoneDiffConsumer for LockstepConsumer {
    fn on_milestone_diff(&mut self, diff: MilestoneDiff) -> Result<(), CallbackError> {
        if self.expected_diffs.next_record().as_ref() != Some(&diff) {
            return Err(mismatch("milestone diff", self.diffs_seen));
        }
        self.diffs_seen += 1;
        Ok(())
    }
}

impl SnapshotConsumer for LockstepConsumer {
    fn on_header(&mut self, header: &ReadFileHeader) -> Result<(), CallbackError> {
        self.header = Some(header.clone());
        Ok(())
    }

    fn on_complete(&mut self, _summary: &ReadSummary) -> Result<(), CallbackError> {
        self.completed = true;
        Ok(())
    }
}

/// Records which callbacks fired, in order
#[derive(Debug, Default)]
pub struct CallLog {
    pub calls: Vec<&'static str>,
}

impl SolidEntryPointConsumer for CallLog {
    fn on_solid_entry_point(&mut self, _sep: BlockId) -> Result<(), CallbackError> {
        self.calls.push("sep");
        Ok(())
    }
}

impl OutputConsumer for CallLog {
    fn on_output(&mut self, _output: Output) -> Result<(), CallbackError> {
        self.calls.push("output");
        Ok(())
    }
}

impl TreasuryOutputConsumer for CallLog {
    fn on_unspent_treasury_output(&mut self, _output: TreasuryOutput) -> Result<(), CallbackError> {
        self.calls.push("treasury");
        Ok(())
    }
}

impl MilestoneDiffConsumer for CallLog {
    fn on_milestone_diff(&mut self, _diff: MilestoneDiff) -> Result<(), CallbackError> {
        self.calls.push("diff");
        Ok(())
    }
}

impl SnapshotConsumer for CallLog {
    fn on_header(&mut self, _header: &ReadFileHeader) -> Result<(), CallbackError> {
        self.calls.push("header");
        Ok(())
    }

    fn on_complete(&mut self, _summary: &ReadSummary) -> Result<(), CallbackError> {
        self.calls.push("complete");
        Ok(())
    }
}
