pub mod block;
pub mod chain;
pub mod constants;
pub mod error;
pub mod hash;
pub mod protocol;
pub mod service;

pub use block::Block;
pub use chain::{ChainFault, FaultKind, Ledger, RepairReport, Validation};
pub use error::{LedgerError, Result};
pub use protocol::{Operation, Request, Response};
pub use service::{OperationService, Reply, ServiceConfig};

pub mod pow {
    use crate::constants::MAX_DIFFICULTY;
    use crate::error::{LedgerError, Result};

    /// Number of leading `'0'` hex digits in a rendered digest.
    pub fn count_leading_zero_digits(hash: &str) -> u32 {
        hash.bytes().take_while(|b| *b == b'0').count() as u32
    }

    /// Proof-of-work condition: at least `difficulty` leading `'0'` hex digits.
    /// A difficulty wider than the digest can never be met.
    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        let difficulty = difficulty as usize;
        hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// Refuse a difficulty no digest can meet; mining for it would never end.
    pub fn check_difficulty(difficulty: u32) -> Result<()> {
        if difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::UnreachableDifficulty {
                difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(())
    }

    pub fn leading_zeros(difficulty: u32) -> String {
        "0".repeat(difficulty as usize)
    }
}
