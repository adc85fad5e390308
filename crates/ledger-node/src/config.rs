use crate::constants::DEFAULT_LISTEN;
use ledger_core::constants::GENESIS_DIFFICULTY;
use ledger_core::pow::check_difficulty;
use ledger_core::{hash, Ledger, OperationService, Result, ServiceConfig};
use std::net::SocketAddr;
use tracing::info;

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub listen: SocketAddr,
    pub genesis_difficulty: u32,
    pub max_difficulty: Option<u32>,
    /// Run the hash-rate benchmark at startup. When off, status reports the
    /// rate as unavailable.
    pub benchmark: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 6789))),
            genesis_difficulty: GENESIS_DIFFICULTY,
            max_difficulty: None,
            benchmark: true,
        }
    }
}

impl NodeConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_difficulty: self.max_difficulty,
        }
    }

    /// Check the digest, mine genesis, benchmark, and hand back a service
    /// ready to take requests. A failed digest self-test or an unreachable
    /// genesis difficulty aborts here.
    pub fn build_service(&self) -> Result<OperationService> {
        hash::self_test()?;
        check_difficulty(self.genesis_difficulty)?;
        let mut ledger = Ledger::with_genesis(self.genesis_difficulty);
        if self.benchmark {
            ledger.compute_hashes_per_second();
        }
        info!(
            genesis_difficulty = self.genesis_difficulty,
            hashes_per_second = ?ledger.hashes_per_second(),
            max_difficulty = ?self.max_difficulty,
            "ledger initialised"
        );
        Ok(OperationService::with_config(ledger, self.service_config()))
    }
}
