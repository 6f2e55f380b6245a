//! Key ordering
//!
//! Keys may embed a version timestamp as a trailing `@<u64>` suffix:
//!
//! ```text
//! user:42@1700000000123
//! └──┬──┘ └─────┬─────┘
//!  prefix    timestamp
//! ```
//!
//! Keys sort by prefix first (bytewise) and, for equal prefixes, by
//! **descending** timestamp, so the newest version of a record is met first
//! during scans. A key without a valid suffix is its own prefix with
//! timestamp 0.

use std::cmp::Ordering;

/// Separator between a key prefix and its timestamp suffix
pub const TIMESTAMP_SEPARATOR: char = '@';

/// Comparator used by the skip list index
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyOrder;

impl KeyOrder {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        compare_keys(a, b)
    }
}

/// Compare two keys: prefix ascending, then timestamp descending
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    let (a_prefix, a_ts) = split_key(a);
    let (b_prefix, b_ts) = split_key(b);

    a_prefix
        .cmp(b_prefix)
        .then_with(|| b_ts.cmp(&a_ts))
}

/// Split a key into `(prefix, timestamp)`
///
/// The split happens at the last `@`. When there is no `@`, or the suffix is
/// not a plain decimal u64, or it parses to 0, the whole key is returned as
/// the prefix with timestamp 0.
pub fn split_key(key: &str) -> (&str, u64) {
    match key.rfind(TIMESTAMP_SEPARATOR) {
        Some(idx) => match parse_suffix(&key[idx + 1..]) {
            0 => (key, 0),
            ts => (&key[..idx], ts),
        },
        None => (key, 0),
    }
}

/// Timestamp embedded in a key, or 0 if it has none
pub fn parse_timestamp(key: &str) -> u64 {
    split_key(key).1
}

// u64::from_str accepts a leading '+', which is not a valid suffix here
fn parse_suffix(suffix: &str) -> u64 {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    suffix.parse().unwrap_or(0)
}
