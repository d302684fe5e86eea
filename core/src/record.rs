//! Generated record type

use crate::traits::Emitted;
use serde::{Deserialize, Serialize};

/// Sequence number of a generated record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sequence(pub u64);

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Sequence {
    fn from(seq: u64) -> Self {
        Self(seq)
    }
}

/// A single generated record
///
/// The value is opaque to the emitter; only `size` feeds the statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Position in the emitted stream
    pub seq: Sequence,

    /// Generated value
    pub value: serde_json::Value,

    /// Size in bytes of the compact JSON encoding of `value`
    pub size: u64,

    /// When the record was produced
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl Record {
    /// Create a record, measuring the value's encoded size
    pub fn new(seq: impl Into<Sequence>, value: serde_json::Value) -> Self {
        let size = json_size(&value);
        Self {
            seq: seq.into(),
            value,
            size,
            generated_at: chrono::Utc::now(),
        }
    }
}

impl Emitted for Record {
    fn byte_size(&self) -> u64 {
        self.size
    }
}

/// Encoded size of a JSON value; `null` counts as empty
pub fn json_size(value: &serde_json::Value) -> u64 {
    if value.is_null() {
        return 0;
    }
    match serde_json::to_vec(value) {
        Ok(bytes) => bytes.len() as u64,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize data");
            0
        }
    }
}
