use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block index {index} is out of range for a chain of {len} blocks")]
    OutOfRange { index: i64, len: usize },

    #[error("the chain has no blocks")]
    EmptyLedger,

    #[error("difficulty {difficulty} can never be met: a digest has only {max} hex digits")]
    UnreachableDifficulty { difficulty: u32, max: u32 },

    #[error("SHA-256 digest unavailable: {0}")]
    DigestUnavailable(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
