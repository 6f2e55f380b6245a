//! Shared helpers for the WAL tests

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use forgekv::{Entry, Wal};
use tempfile::TempDir;

pub fn setup_temp_wal() -> (TempDir, PathBuf, Wal) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    let wal = Wal::open(&wal_path).unwrap();
    (temp_dir, wal_path, wal)
}

/// The three records used throughout: two puts and a tombstone for k1
pub fn sample_entries() -> Vec<Entry> {
    vec![
        Entry::new("k1", b"v1".to_vec(), 1),
        Entry::new("k2", b"v2".to_vec(), 2),
        Entry::tombstone("k1", 3),
    ]
}

pub fn numbered_entries(count: usize) -> Vec<Entry> {
    (0..count)
        .map(|i| Entry {
            key: format!("batch_test:{:03}", i),
            value: format!("value {}", i).into_bytes(),
            tombstone: i % 3 == 0,
            version: i as i64 + 1,
        })
        .collect()
}

/// Append raw bytes behind the WAL's back (for crafting corruption)
pub fn append_raw(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}
