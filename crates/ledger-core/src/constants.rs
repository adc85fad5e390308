pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Highest difficulty a digest can satisfy: every hex digit zero.
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;

pub const GENESIS_DATA: &str = "Genesis";
pub const GENESIS_DIFFICULTY: u32 = 2;

/// Number of digests timed by the hash-rate benchmark.
pub const BENCHMARK_ITERATIONS: u64 = 2_000_000;
pub const BENCHMARK_SAMPLE: &str = "00000000";

/// Rendering used for block timestamps, both in the hash input and on the wire.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Sentinel reported by a successful chain validation.
pub const VALID_CHAIN: &str = "TRUE";
