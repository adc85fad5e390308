//! SHA-256 hashing over text, rendered as uppercase hex, plus a rough hash-rate benchmark.

use crate::constants::{BENCHMARK_SAMPLE, HASH_HEX_SIZE};
use crate::error::{LedgerError, Result};
use sha2::{Digest, Sha256};
use std::time::Instant;
use tracing::info;

const SELF_TEST_INPUT: &str = "abc";
const SELF_TEST_DIGEST: &str = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";

/// Hash the UTF-8 bytes of `text` and return the 64-character uppercase hex digest.
pub fn digest(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode_upper(digest)
}

/// Known-answer check of the digest primitive. Callers treat a failure as fatal.
pub fn self_test() -> Result<()> {
    let got = digest(SELF_TEST_INPUT);
    if got.len() != HASH_HEX_SIZE || got != SELF_TEST_DIGEST {
        return Err(LedgerError::DigestUnavailable(format!(
            "known-answer test failed: expected {SELF_TEST_DIGEST}, got {got}"
        )));
    }
    Ok(())
}

/// Time `iterations` digests of a fixed sample and return `iterations / elapsed_ms`.
///
/// Returns `None` when the run finished in under a millisecond, since no rate can be derived.
pub fn benchmark_rate(iterations: u64) -> Option<u64> {
    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(digest(std::hint::black_box(BENCHMARK_SAMPLE)));
    }
    let elapsed_ms = start.elapsed().as_millis();
    let rate = rate_from(iterations, elapsed_ms);
    info!(iterations, elapsed_ms = elapsed_ms as u64, ?rate, "hash rate benchmark finished");
    rate
}

fn rate_from(iterations: u64, elapsed_ms: u128) -> Option<u64> {
    if elapsed_ms == 0 {
        return None;
    }
    u64::try_from(u128::from(iterations) / elapsed_ms).ok()
}
