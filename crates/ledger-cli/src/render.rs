//! Human-readable rendering of responses for the terminal.

use ledger_core::constants::VALID_CHAIN;
use ledger_core::protocol::{StatusReport, VerificationReply};
use ledger_core::Response;
use std::io::{self, Write};

pub fn render<W: Write>(response: &Response, out: &mut W) -> io::Result<()> {
    match response {
        Response::Status(report) => status(report, out),
        Response::Normal(reply) => writeln!(out, "{}", reply.response),
        Response::Verification(reply) => verification(reply, out),
        Response::ChainDump(dump) => {
            let text = serde_json::to_string_pretty(dump).map_err(io::Error::other)?;
            writeln!(out, "{text}")
        }
    }
}

fn status<W: Write>(report: &StatusReport, out: &mut W) -> io::Result<()> {
    let rate = report
        .hashes_per_second
        .map_or_else(|| "unavailable".to_string(), |hps| hps.to_string());
    writeln!(out, "Current size of chain: {}", report.chain_size)?;
    writeln!(out, "Difficulty of most recent block: {}", report.difficulty)?;
    writeln!(out, "Total difficulty for all blocks: {}", report.total_difficulty)?;
    writeln!(out, "Approximate hashes per second on this machine: {rate}")?;
    writeln!(
        out,
        "Expected total hashes required for the whole chain: {:.6}",
        report.total_hashes as f64
    )?;
    writeln!(out, "Nonce for most recent block: {}", report.recent_nonce)?;
    writeln!(out, "Chain hash: {}", report.chain_hash)
}

fn verification<W: Write>(reply: &VerificationReply, out: &mut W) -> io::Result<()> {
    if reply.verification_op == VALID_CHAIN {
        writeln!(out, "Chain verification: TRUE")?;
    } else {
        writeln!(out, "Chain verification: FALSE")?;
        writeln!(out, "{}", reply.verification_op)?;
    }
    writeln!(out, "{}", reply.response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::protocol::{ChainDump, NormalReply};
    use ledger_core::Ledger;

    fn rendered(response: &Response) -> String {
        let mut out = Vec::new();
        render(response, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn report(hashes_per_second: Option<u64>) -> StatusReport {
        StatusReport {
            choice: 0,
            chain_size: 2,
            chain_hash: "00AB".into(),
            total_hashes: 272,
            total_difficulty: 3,
            recent_nonce: 17,
            difficulty: 1,
            hashes_per_second,
        }
    }

    #[test]
    fn status_lines() {
        let text = rendered(&Response::Status(report(Some(1_500_000))));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Current size of chain: 2",
                "Difficulty of most recent block: 1",
                "Total difficulty for all blocks: 3",
                "Approximate hashes per second on this machine: 1500000",
                "Expected total hashes required for the whole chain: 272.000000",
                "Nonce for most recent block: 17",
                "Chain hash: 00AB",
            ]
        );
    }

    #[test]
    fn missing_rate_is_unavailable() {
        let text = rendered(&Response::Status(report(None)));
        assert!(text.contains("Approximate hashes per second on this machine: unavailable"));
    }

    #[test]
    fn verification_verdicts() {
        let ok = rendered(&Response::Verification(VerificationReply {
            choice: 2,
            response: "Total execution time to verify the chain was 0 milliseconds".into(),
            verification_op: VALID_CHAIN.into(),
        }));
        assert!(ok.starts_with("Chain verification: TRUE\n"));

        let bad = rendered(&Response::Verification(VerificationReply {
            choice: 2,
            response: "Total execution time to verify the chain was 0 milliseconds".into(),
            verification_op: "Improper hash on node 0. Does not begin with 00".into(),
        }));
        assert!(bad.contains("Improper hash on node 0"));
        assert!(bad.contains("Chain verification: FALSE"));
    }

    #[test]
    fn normal_and_dump() {
        let text = rendered(&Response::Normal(NormalReply {
            choice: 4,
            response: "Block 0 now holds hacked".into(),
        }));
        assert_eq!(text, "Block 0 now holds hacked\n");

        let ledger = Ledger::with_genesis(0);
        let text = rendered(&Response::ChainDump(ChainDump {
            choice: 3,
            chain_hash: ledger.chain_hash().to_string(),
            blocks: ledger.blocks().to_vec(),
        }));
        assert!(text.contains("\"chainHash\""));
        assert!(text.contains("\"Genesis\""));
    }
}
