use crate::constants::TIMESTAMP_FORMAT;
use crate::hash::digest;
use crate::pow::meets_difficulty;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A single ledger record.
///
/// The hash is never stored: it is always recomputed from the fields, so
/// changing `data` or `previous_hash` silently invalidates the block until
/// something re-mines it. Keeping the proof-of-work and linkage consistent is
/// the ledger's job, not the block's.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    index: u64,
    #[serde(rename = "timeStamp", with = "timestamp_text")]
    timestamp: DateTime<Utc>,
    data: String,
    previous_hash: String,
    nonce: u128,
    difficulty: u32,
}

impl Block {
    /// New unmined block stamped with the current time and an empty parent pointer.
    pub fn new(index: u64, data: impl Into<String>, difficulty: u32) -> Self {
        Self::with_timestamp(index, Utc::now(), data, difficulty)
    }

    pub fn with_timestamp(
        index: u64,
        timestamp: DateTime<Utc>,
        data: impl Into<String>,
        difficulty: u32,
    ) -> Self {
        Self {
            index,
            timestamp: timestamp.trunc_subsecs(3),
            data: data.into(),
            previous_hash: String::new(),
            nonce: 0,
            difficulty,
        }
    }

    /// Text fed to the digest: every field concatenated, no delimiters.
    ///
    /// Without separators `index=1,data="2x"` and `index=12,data="x"` produce
    /// the same input. The layout is kept as-is so existing hashes stay valid.
    pub fn hash_input(&self) -> String {
        let mut input = self.hash_prefix();
        input.push_str(&self.nonce.to_string());
        input.push_str(&self.difficulty.to_string());
        input
    }

    fn hash_prefix(&self) -> String {
        format!(
            "{}{}{}{}",
            self.index,
            self.timestamp_text(),
            self.data,
            self.previous_hash
        )
    }

    /// Digest of the current fields. No searching.
    pub fn hash(&self) -> String {
        digest(&self.hash_input())
    }

    /// Whether the current fields already satisfy this block's own difficulty.
    pub fn has_valid_proof(&self) -> bool {
        meets_difficulty(&self.hash(), self.difficulty)
    }

    /// Search `nonce` upward from its current value until the digest carries
    /// `difficulty` leading hex zeros, and return that digest.
    ///
    /// There is no upper bound: the cost grows as 16^difficulty.
    pub fn mine(&mut self) -> String {
        let prefix = self.hash_prefix();
        let suffix = self.difficulty.to_string();
        let mut input = String::with_capacity(prefix.len() + 40 + suffix.len());
        loop {
            input.clear();
            input.push_str(&prefix);
            input.push_str(&self.nonce.to_string());
            input.push_str(&suffix);
            let hash = digest(&input);
            if meets_difficulty(&hash, self.difficulty) {
                return hash;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u128 {
        self.nonce
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn set_index(&mut self, index: u64) {
        self.index = index;
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp.trunc_subsecs(3);
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    pub fn set_previous_hash(&mut self, previous_hash: impl Into<String>) {
        self.previous_hash = previous_hash.into();
    }

    pub fn set_nonce(&mut self, nonce: u128) {
        self.nonce = nonce;
    }

    pub fn set_difficulty(&mut self, difficulty: u32) {
        self.difficulty = difficulty;
    }
}

mod timestamp_text {
    use crate::constants::TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
