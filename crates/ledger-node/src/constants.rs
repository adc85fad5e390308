pub const DEFAULT_LISTEN: &str = "127.0.0.1:6789";
/// Ceiling for a single wire line; a request is a handful of short fields.
pub const MAX_LINE_BYTES: usize = 1 << 20;
