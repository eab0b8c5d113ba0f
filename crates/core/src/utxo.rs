//! UTXO ledger records
//!
//! These are the entities carried by ledger snapshots. They hold no behavior
//! beyond simple accessors; the ledger store and the snapshot codecs decide
//! how they are stored and encoded.

use crate::types::{
    Address, BlockId, MilestoneId, MilestoneIndex, MilestoneTimestamp, OutputId, TransactionId,
};

/// An output of the UTXO ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Output {
    /// Identifier of the output
    pub output_id: OutputId,
    /// Block that contained the creating transaction
    pub block_id: BlockId,
    /// Milestone that booked the output into the ledger
    pub milestone_index_booked: MilestoneIndex,
    /// Timestamp of the booking milestone
    pub milestone_timestamp_booked: MilestoneTimestamp,
    /// Address owning the output
    pub address: Address,
    /// Amount of base tokens held by the output
    pub amount: u64,
}

impl Output {
    /// Create a new output record
    pub fn new(
        output_id: OutputId,
        block_id: BlockId,
        milestone_index_booked: MilestoneIndex,
        milestone_timestamp_booked: MilestoneTimestamp,
        address: Address,
        amount: u64,
    ) -> Self {
        Output {
            output_id,
            block_id,
            milestone_index_booked,
            milestone_timestamp_booked,
            address,
            amount,
        }
    }
}

/// An output that was consumed by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Spent {
    /// The consumed output
    pub output: Output,
    /// Transaction that consumed the output
    pub transaction_id_spent: TransactionId,
    /// Milestone that confirmed the spend
    pub milestone_index_spent: MilestoneIndex,
    /// Timestamp of the confirming milestone
    pub milestone_timestamp_spent: MilestoneTimestamp,
}

impl Spent {
    /// Create a new spent record
    pub fn new(
        output: Output,
        transaction_id_spent: TransactionId,
        milestone_index_spent: MilestoneIndex,
        milestone_timestamp_spent: MilestoneTimestamp,
    ) -> Self {
        Spent {
            output,
            transaction_id_spent,
            milestone_index_spent,
            milestone_timestamp_spent,
        }
    }

    /// Identifier of the consumed output
    pub fn output_id(&self) -> OutputId {
        self.output.output_id
    }
}

/// The protocol treasury output
///
/// At most one unspent treasury output exists in the ledger at any time.
/// Milestones carrying a receipt spend the current one and create its
/// successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TreasuryOutput {
    /// Milestone that created the treasury output
    pub milestone_id: MilestoneId,
    /// Amount held by the treasury
    pub amount: u64,
    /// Whether the output has been spent
    pub spent: bool,
}

impl TreasuryOutput {
    /// Create an unspent treasury output
    pub fn unspent(milestone_id: MilestoneId, amount: u64) -> Self {
        TreasuryOutput {
            milestone_id,
            amount,
            spent: false,
        }
    }

    /// Create a spent treasury output
    pub fn spent(milestone_id: MilestoneId, amount: u64) -> Self {
        TreasuryOutput {
            milestone_id,
            amount,
            spent: true,
        }
    }
}
