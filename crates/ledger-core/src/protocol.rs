//! Wire messages: one JSON object per line in each direction.
//!
//! Requests carry an integer `operation` (0–6); responses echo it back as
//! `choice`. Both sides parse once into a plain value and branch on the
//! discriminating field, rather than guessing a shape.

use crate::block::Block;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Status,
    Add,
    Verify,
    View,
    Corrupt,
    Repair,
    Exit,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Status,
        Operation::Add,
        Operation::Verify,
        Operation::View,
        Operation::Corrupt,
        Operation::Repair,
        Operation::Exit,
    ];

    pub fn code(self) -> i64 {
        match self {
            Operation::Status => 0,
            Operation::Add => 1,
            Operation::Verify => 2,
            Operation::View => 3,
            Operation::Corrupt => 4,
            Operation::Repair => 5,
            Operation::Exit => 6,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Status,
    Add { difficulty: u32, data: String },
    Verify,
    View,
    /// `block_id` is kept signed so that a negative id is reported as out of
    /// range rather than as an undecodable request.
    Corrupt { block_id: i64, data: String },
    Repair,
    Exit,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    operation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction_data: Option<String>,
    #[serde(default, rename = "blockID", skip_serializing_if = "Option::is_none")]
    block_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Status => Operation::Status,
            Request::Add { .. } => Operation::Add,
            Request::Verify => Operation::Verify,
            Request::View => Operation::View,
            Request::Corrupt { .. } => Operation::Corrupt,
            Request::Repair => Operation::Repair,
            Request::Exit => Operation::Exit,
        }
    }

    pub fn decode(line: &str) -> Result<Self> {
        let wire: WireRequest = serde_json::from_str(line.trim())
            .map_err(|e| LedgerError::MalformedRequest(format!("undecodable request: {e}")))?;
        let op = Operation::from_code(wire.operation).ok_or_else(|| {
            LedgerError::MalformedRequest(format!("unsupported operation {}", wire.operation))
        })?;
        let request = match op {
            Operation::Status => Request::Status,
            Operation::Add => {
                let difficulty = wire
                    .difficulty
                    .ok_or_else(|| missing(op, "difficulty"))?;
                let difficulty = u32::try_from(difficulty).map_err(|_| {
                    LedgerError::MalformedRequest(format!(
                        "difficulty must be a non-negative integer, got {difficulty}"
                    ))
                })?;
                let data = wire
                    .transaction_data
                    .ok_or_else(|| missing(op, "transactionData"))?;
                Request::Add { difficulty, data }
            }
            Operation::Verify => Request::Verify,
            Operation::View => Request::View,
            Operation::Corrupt => Request::Corrupt {
                block_id: wire.block_id.ok_or_else(|| missing(op, "blockID"))?,
                data: wire.data.ok_or_else(|| missing(op, "data"))?,
            },
            Operation::Repair => Request::Repair,
            Operation::Exit => Request::Exit,
        };
        Ok(request)
    }

    pub fn encode(&self) -> Result<String> {
        let mut wire = WireRequest {
            operation: self.operation().code(),
            ..WireRequest::default()
        };
        match self {
            Request::Add { difficulty, data } => {
                wire.difficulty = Some(i64::from(*difficulty));
                wire.transaction_data = Some(data.clone());
            }
            Request::Corrupt { block_id, data } => {
                wire.block_id = Some(*block_id);
                wire.data = Some(data.clone());
            }
            _ => {}
        }
        Ok(serde_json::to_string(&wire)?)
    }
}

fn missing(op: Operation, field: &str) -> LedgerError {
    LedgerError::MalformedRequest(format!("operation {} requires `{field}`", op.code()))
}

/// Best-effort read of the operation code from a line that failed to decode,
/// so the error reply can still echo it.
pub fn peek_operation(line: &str) -> Option<i64> {
    serde_json::from_str::<Value>(line.trim())
        .ok()?
        .get("operation")?
        .as_i64()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub choice: i64,
    pub chain_size: u64,
    pub chain_hash: String,
    /// Expected hashes for the whole chain, truncated to an integer.
    pub total_hashes: u64,
    pub total_difficulty: u64,
    pub recent_nonce: u128,
    pub difficulty: u32,
    /// `None` when the benchmark was skipped or too fast to measure.
    pub hashes_per_second: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalReply {
    pub choice: i64,
    pub response: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReply {
    pub choice: i64,
    pub response: String,
    /// `"TRUE"` or a description of the first fault.
    pub verification_op: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDump {
    pub choice: i64,
    pub chain_hash: String,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Status(StatusReport),
    Normal(NormalReply),
    Verification(VerificationReply),
    ChainDump(ChainDump),
}

impl Response {
    pub fn normal(choice: i64, response: impl Into<String>) -> Self {
        Response::Normal(NormalReply {
            choice,
            response: response.into(),
        })
    }

    pub fn choice(&self) -> i64 {
        match self {
            Response::Status(r) => r.choice,
            Response::Normal(r) => r.choice,
            Response::Verification(r) => r.choice,
            Response::ChainDump(r) => r.choice,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Shapes are told apart by their distinguishing key.
    pub fn decode(line: &str) -> Result<Self> {
        let line = line.trim();
        let value: Value = serde_json::from_str(line)?;
        let has = |key: &str| value.get(key).is_some();
        let response = if has("verificationOp") {
            Response::Verification(serde_json::from_str(line)?)
        } else if has("blocks") {
            Response::ChainDump(serde_json::from_str(line)?)
        } else if has("chainSize") {
            Response::Status(serde_json::from_str(line)?)
        } else {
            Response::Normal(serde_json::from_str(line)?)
        };
        Ok(response)
    }
}
