//! Entry definitions
//!
//! The record shared by the WAL and the skip list index, plus the codec
//! seam used to turn it into bytes for the log.

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};
use crate::key;

/// A single versioned key-value record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entry {
    /// Record key, optionally carrying an `@<timestamp>` suffix
    pub key: String,

    /// Raw value bytes (empty for tombstones written by `delete`)
    pub value: Vec<u8>,

    /// Soft-delete marker
    pub tombstone: bool,

    /// Monotonic version assigned by the writer
    pub version: i64,
}

impl Entry {
    /// Create a live entry
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>, version: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            tombstone: false,
            version,
        }
    }

    /// Create a tombstone for `key`
    pub fn tombstone(key: impl Into<String>, version: i64) -> Self {
        Self {
            key: key.into(),
            value: Vec::new(),
            tombstone: true,
            version,
        }
    }

    /// Timestamp embedded in the key (0 when the key has none)
    pub fn timestamp(&self) -> u64 {
        key::parse_timestamp(&self.key)
    }

    /// Whether this entry marks its key as deleted
    pub fn is_tombstone(&self) -> bool {
        self.tombstone
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Turns entries into the opaque payload stored in a WAL record
pub trait EntryCodec: Send + Sync {
    fn encode(&self, entry: &Entry) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Entry>;
}

/// Default codec: bincode over the serde representation of [`Entry`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl EntryCodec for BincodeCodec {
    fn encode(&self, entry: &Entry) -> Result<Vec<u8>> {
        bincode::serialize(entry)
            .map_err(|e| ForgeError::Serialization(format!("failed to marshal entry: {}", e)))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entry> {
        bincode::deserialize(bytes)
            .map_err(|e| ForgeError::Serialization(format!("failed to unmarshal entry: {}", e)))
    }
}
