//! The ledger: an ordered run of blocks plus the tip pointer (`chain_hash`).
//!
//! Invariants restored by [`Ledger::repair`] and checked by [`Ledger::validate`]:
//! every block satisfies its own difficulty, `blocks[i + 1].previous_hash`
//! equals `blocks[i].hash()`, and `chain_hash` equals the last block's hash.

use crate::block::Block;
use crate::constants::{BENCHMARK_ITERATIONS, GENESIS_DATA, VALID_CHAIN};
use crate::error::{LedgerError, Result};
use crate::hash;
use crate::pow::{leading_zeros, meets_difficulty};
use std::fmt;
use tracing::{debug, info};

#[derive(Clone, Debug, Default)]
pub struct Ledger {
    blocks: Vec<Block>,
    chain_hash: String,
    hashes_per_second: Option<u64>,
}

/// Which invariant a block broke.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// The block's own hash lacks `difficulty` leading zeros.
    ImproperHash { difficulty: u32 },
    /// The next block's `previous_hash` does not point at this block.
    BrokenLink,
    /// The last block's hash differs from the ledger's `chain_hash`.
    TipMismatch,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainFault {
    pub index: usize,
    pub kind: FaultKind,
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let i = self.index;
        match self.kind {
            FaultKind::ImproperHash { difficulty } => write!(
                f,
                "Improper hash on node {i}. Does not begin with {}",
                leading_zeros(difficulty)
            ),
            FaultKind::BrokenLink => write!(
                f,
                "Hash of Block {i} does not match with previous hash of Block {}",
                i + 1
            ),
            FaultKind::TipMismatch => write!(
                f,
                "Hash of the last Block (Block {i}) does not match with Chain Hash!"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(ChainFault),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// Wire rendering: `"TRUE"` or the fault description.
    pub fn verdict(&self) -> String {
        match self {
            Validation::Valid => VALID_CHAIN.to_string(),
            Validation::Invalid(fault) => fault.to_string(),
        }
    }
}

/// What a repair pass had to touch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub remined: Vec<usize>,
    pub relinked: Vec<usize>,
    pub tip_updated: bool,
}

impl RepairReport {
    pub fn is_noop(&self) -> bool {
        self.remined.is_empty() && self.relinked.is_empty() && !self.tip_updated
    }
}

impl Ledger {
    /// Empty ledger with no tip. Most callers want [`Ledger::with_genesis`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger holding a single mined genesis block.
    pub fn with_genesis(difficulty: u32) -> Self {
        let mut ledger = Self::new();
        let genesis = Block::new(0, GENESIS_DATA, difficulty);
        ledger.append(genesis);
        info!(difficulty, chain_hash = %ledger.chain_hash, "genesis block mined");
        ledger
    }

    /// Build the next block: index = current size, parent = current tip.
    pub fn next_block(&self, data: impl Into<String>, difficulty: u32) -> Block {
        let mut block = Block::new(self.blocks.len() as u64, data, difficulty);
        block.set_previous_hash(self.chain_hash.clone());
        block
    }

    /// Mine `block`, make it the tip and append it. The caller is responsible
    /// for having pointed `previous_hash` at the current tip; prior blocks are
    /// not revalidated.
    pub fn append(&mut self, mut block: Block) -> &str {
        let hash = block.mine();
        debug!(
            index = block.index(),
            nonce = %block.nonce(),
            difficulty = block.difficulty(),
            %hash,
            "block mined"
        );
        self.chain_hash = hash;
        self.blocks.push(block);
        &self.chain_hash
    }

    pub fn get(&self, index: usize) -> Result<&Block> {
        let len = self.blocks.len();
        self.blocks.get(index).ok_or(LedgerError::OutOfRange {
            index: index as i64,
            len,
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Block> {
        let len = self.blocks.len();
        self.blocks.get_mut(index).ok_or(LedgerError::OutOfRange {
            index: index as i64,
            len,
        })
    }

    pub fn latest(&self) -> Result<&Block> {
        self.blocks.last().ok_or(LedgerError::EmptyLedger)
    }

    /// Overwrite a block's data without re-mining. This deliberately breaks
    /// the chain; only the index is checked.
    pub fn corrupt(&mut self, index: usize, data: impl Into<String>) -> Result<&Block> {
        let block = self.get_mut(index)?;
        block.set_data(data);
        Ok(&*block)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn chain_hash(&self) -> &str {
        &self.chain_hash
    }

    pub fn hashes_per_second(&self) -> Option<u64> {
        self.hashes_per_second
    }

    /// Run the standard benchmark and remember the result for status reports.
    pub fn compute_hashes_per_second(&mut self) -> Option<u64> {
        self.measure_hashes_per_second(BENCHMARK_ITERATIONS)
    }

    pub fn measure_hashes_per_second(&mut self, iterations: u64) -> Option<u64> {
        self.hashes_per_second = hash::benchmark_rate(iterations);
        self.hashes_per_second
    }

    pub fn total_difficulty(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.difficulty())).sum()
    }

    /// Sum of 16^difficulty over all blocks: the expected number of attempts
    /// to mine the whole chain under a uniform hash.
    pub fn total_expected_hashes(&self) -> f64 {
        self.blocks
            .iter()
            .map(|b| 16f64.powi(b.difficulty() as i32))
            .sum()
    }

    /// Single forward pass; reports the first broken invariant.
    pub fn validate(&self) -> Validation {
        let last = self.blocks.len().saturating_sub(1);
        for (i, block) in self.blocks.iter().enumerate() {
            let hash = block.hash();
            if !meets_difficulty(&hash, block.difficulty()) {
                return Validation::Invalid(ChainFault {
                    index: i,
                    kind: FaultKind::ImproperHash {
                        difficulty: block.difficulty(),
                    },
                });
            }
            if i < last && hash != self.blocks[i + 1].previous_hash() {
                return Validation::Invalid(ChainFault {
                    index: i,
                    kind: FaultKind::BrokenLink,
                });
            }
            if i == last && hash != self.chain_hash {
                return Validation::Invalid(ChainFault {
                    index: i,
                    kind: FaultKind::TipMismatch,
                });
            }
        }
        Validation::Valid
    }

    /// Restore every invariant in one forward pass.
    ///
    /// A block whose own proof no longer holds is re-mined from nonce 0; its
    /// resulting hash is then pushed into the next block's `previous_hash`
    /// (or into `chain_hash` for the last block). Because that changes the
    /// next block's hash input, the fix cascades to the tip.
    pub fn repair(&mut self) -> RepairReport {
        let mut report = RepairReport::default();
        let len = self.blocks.len();
        for i in 0..len {
            let block = &mut self.blocks[i];
            if len == 1 && !block.previous_hash().is_empty() {
                block.set_previous_hash("");
            }
            if !block.has_valid_proof() {
                block.set_nonce(0);
                block.mine();
                report.remined.push(i);
            }
            let hash = block.hash();
            if i + 1 < len {
                let next = &mut self.blocks[i + 1];
                if next.previous_hash() != hash {
                    next.set_previous_hash(hash);
                    report.relinked.push(i + 1);
                }
            } else if self.chain_hash != hash {
                self.chain_hash = hash;
                report.tip_updated = true;
            }
        }
        info!(
            remined = report.remined.len(),
            relinked = report.relinked.len(),
            tip_updated = report.tip_updated,
            "chain repaired"
        );
        report
    }
}
