use crate::chain::Ledger;
use crate::error::{LedgerError, Result};
use crate::pow::check_difficulty;
use crate::protocol::{
    peek_operation, ChainDump, Request, Response, StatusReport, VerificationReply,
};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
pub struct ServiceConfig {
    /// Add requests above this difficulty are refused. `None` means no cap, in
    /// which case a large difficulty occupies the service for as long as mining takes.
    pub max_difficulty: Option<u32>,
}

/// Outcome of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Respond(Response),
    /// The caller asked to end the session; nothing is written back.
    Close,
}

/// Turns decoded requests into ledger calls. Owns the single ledger instance
/// for the life of the process; callers are served one at a time.
#[derive(Debug)]
pub struct OperationService {
    ledger: Ledger,
    config: ServiceConfig,
}

impl OperationService {
    pub fn new(ledger: Ledger) -> Self {
        Self::with_config(ledger, ServiceConfig::default())
    }

    pub fn with_config(ledger: Ledger, config: ServiceConfig) -> Self {
        Self { ledger, config }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Decode one wire line and dispatch it. Undecodable input is answered
    /// with a normal response explaining the problem.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        match Request::decode(line) {
            Ok(request) => self.dispatch(request),
            Err(err) => {
                let choice = peek_operation(line).unwrap_or(-1);
                warn!(choice, %err, "rejecting request");
                Reply::Respond(Response::normal(choice, err.to_string()))
            }
        }
    }

    pub fn dispatch(&mut self, request: Request) -> Reply {
        let choice = request.operation().code();
        debug!(?request, "dispatching");
        let result = match request {
            Request::Status => self.status(choice),
            Request::Add { difficulty, data } => self.add(choice, difficulty, data),
            Request::Verify => Ok(self.verify(choice)),
            Request::View => Ok(self.view(choice)),
            Request::Corrupt { block_id, data } => self.corrupt(choice, block_id, data),
            Request::Repair => Ok(self.repair(choice)),
            Request::Exit => return Reply::Close,
        };
        match result {
            Ok(response) => Reply::Respond(response),
            Err(err) => {
                warn!(choice, %err, "request failed");
                Reply::Respond(Response::normal(choice, err.to_string()))
            }
        }
    }

    fn status(&self, choice: i64) -> Result<Response> {
        let latest = self.ledger.latest()?;
        Ok(Response::Status(StatusReport {
            choice,
            chain_size: self.ledger.len() as u64,
            chain_hash: self.ledger.chain_hash().to_string(),
            total_hashes: self.ledger.total_expected_hashes() as u64,
            total_difficulty: self.ledger.total_difficulty(),
            recent_nonce: latest.nonce(),
            difficulty: latest.difficulty(),
            hashes_per_second: self.ledger.hashes_per_second(),
        }))
    }

    fn add(&mut self, choice: i64, difficulty: u32, data: String) -> Result<Response> {
        check_difficulty(difficulty)?;
        if let Some(max) = self.config.max_difficulty {
            if difficulty > max {
                return Ok(Response::normal(
                    choice,
                    format!("Difficulty {difficulty} exceeds the maximum of {max}; no block was added"),
                ));
            }
        }
        let block = self.ledger.next_block(data, difficulty);
        let start = Instant::now();
        self.ledger.append(block);
        let elapsed = start.elapsed().as_millis();
        info!(
            index = self.ledger.len() - 1,
            difficulty,
            elapsed_ms = elapsed as u64,
            "block added"
        );
        Ok(Response::normal(
            choice,
            format!("Total execution time to add this block was {elapsed} milliseconds"),
        ))
    }

    fn verify(&self, choice: i64) -> Response {
        let start = Instant::now();
        let validation = self.ledger.validate();
        let elapsed = start.elapsed().as_millis();
        info!(valid = validation.is_valid(), elapsed_ms = elapsed as u64, "chain verified");
        Response::Verification(VerificationReply {
            choice,
            response: format!("Total execution time to verify the chain was {elapsed} milliseconds"),
            verification_op: validation.verdict(),
        })
    }

    fn view(&self, choice: i64) -> Response {
        Response::ChainDump(ChainDump {
            choice,
            chain_hash: self.ledger.chain_hash().to_string(),
            blocks: self.ledger.blocks().to_vec(),
        })
    }

    fn corrupt(&mut self, choice: i64, block_id: i64, data: String) -> Result<Response> {
        let len = self.ledger.len();
        let index = usize::try_from(block_id).map_err(|_| LedgerError::OutOfRange {
            index: block_id,
            len,
        })?;
        let block = self.ledger.corrupt(index, data)?;
        let message = format!("Block {block_id} now holds {}", block.data());
        info!(block_id, "block corrupted");
        Ok(Response::normal(choice, message))
    }

    fn repair(&mut self, choice: i64) -> Response {
        let start = Instant::now();
        self.ledger.repair();
        let elapsed = start.elapsed().as_millis();
        Response::normal(
            choice,
            format!("Total execution time required to repair the chain was {elapsed} milliseconds"),
        )
    }
}
