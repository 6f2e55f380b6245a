//! MemTable implementation
//!
//! Skip list index behind an RwLock, fronted by a write-ahead log.

use std::fs;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::compress::ZstdCompressor;
use crate::config::Config;
use crate::entry::Entry;
use crate::error::{ForgeError, Result};
use crate::skiplist::SkipList;
use crate::wal::{open_log_file, Wal};

use super::recovery::{RecoveryGuard, RecoveryReport, RecoveryState};

/// In-memory write buffer backed by a WAL
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (`set`, `set_batch`, `delete`): exclusive index lock, held
///   across the WAL append so log order always matches apply order
///   - Lock order: index lock → WAL lock
/// - **Reads** (`get`, `scan`, `all`): shared index lock, never touch the WAL
/// - **Recovery**: runs at most once; writers arriving while it runs wait
///   for it to finish
pub struct MemTable {
    /// Ordered index of the latest record per key
    index: RwLock<SkipList>,

    /// Durable log every write goes through first
    wal: Wal,

    /// Run-once gate for `recovery`
    recovery: RecoveryGuard,

    /// Outcome of the replay, once it ran
    report: Mutex<Option<RecoveryReport>>,

    /// Records per batch when replaying the WAL
    recovery_batch_size: usize,
}

impl MemTable {
    /// Compose a memtable from an already-bound WAL and an index
    pub fn new(wal: Wal, index: SkipList, recovery_batch_size: usize) -> Self {
        Self {
            index: RwLock::new(index),
            wal,
            recovery: RecoveryGuard::new(),
            report: Mutex::new(None),
            recovery_batch_size: recovery_batch_size.max(1),
        }
    }

    /// Open the WAL under `config.data_dir` and build an empty index
    ///
    /// Does not replay the log; call [`MemTable::recovery`] for that.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.data_dir).map_err(|e| {
            ForgeError::io(
                format!("failed to create data directory {}", config.data_dir.display()),
                e,
            )
        })?;

        let wal_path = config.wal_path();
        let file = open_log_file(&wal_path)?;

        let mut builder = Wal::builder().handle(file);
        if config.wal_compression {
            builder = builder.compressor(Arc::new(ZstdCompressor::new(config.compression_level)));
        }

        info!(
            wal = %wal_path.display(),
            compression = config.wal_compression,
            max_level = config.max_level,
            "memtable opened"
        );

        Ok(Self::new(
            builder.build(),
            SkipList::new(config.max_level, config.probability),
            config.recovery_batch_size,
        ))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Log `entry` durably, then apply it to the index
    ///
    /// If the WAL write fails the index is left untouched.
    pub fn set(&self, entry: Entry) -> Result<()> {
        self.recovery.wait();

        let mut index = self.index.write();
        self.wal.write(std::slice::from_ref(&entry))?;
        index.set(entry);
        Ok(())
    }

    /// Log all `entries` with a single sync, then apply them in order
    pub fn set_batch(&self, entries: Vec<Entry>) -> Result<usize> {
        self.recovery.wait();

        let mut index = self.index.write();
        let written = self.wal.write(&entries)?;
        for entry in entries {
            index.set(entry);
        }
        Ok(written)
    }

    /// Write a tombstone for `key`
    pub fn delete(&self, key: impl Into<String>, version: i64) -> Result<()> {
        self.set(Entry::tombstone(key, version))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Latest record for `key` (tombstones included), from the index only
    pub fn get(&self, key: &str) -> Option<Entry> {
        self.index.read().get(key).cloned()
    }

    /// Records with `start <= key <= end`, in key order
    pub fn scan(&self, start: &str, end: &str) -> Vec<Entry> {
        self.index
            .read()
            .scan(start, end)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every record in key order
    pub fn all(&self) -> Vec<Entry> {
        self.index.read().iter().cloned().collect()
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Replay the WAL into the index, at most once per memtable
    ///
    /// Later calls return immediately; concurrent callers block until the
    /// first one finishes. Failures are logged, not returned: whatever was
    /// replayed before the failure stays in the index. See
    /// [`MemTable::recovery_report`] for the outcome.
    pub fn recovery(&self) {
        let ran = self.recovery.run_once(|| {
            let report = self.replay();
            *self.report.lock() = Some(report);
        });
        if !ran {
            debug!("memtable recovery already performed");
        }
    }

    pub fn recovery_state(&self) -> RecoveryState {
        self.recovery.state()
    }

    /// Outcome of the replay, `None` until `recovery` has completed
    pub fn recovery_report(&self) -> Option<RecoveryReport> {
        self.report.lock().clone()
    }

    fn replay(&self) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        let stream = match self.wal.read_batch(self.recovery_batch_size) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "recovery memtable");
                report.error = Some(e.to_string());
                return report;
            }
        };

        for batch in stream {
            match batch {
                Ok(entries) => {
                    let mut index = self.index.write();
                    report.batches += 1;
                    report.entries_replayed += entries.len() as u64;
                    for entry in entries {
                        index.set(entry);
                    }
                }
                Err(e) => {
                    error!(
                        error = %e,
                        replayed = report.entries_replayed,
                        "recovery memtable stopped early, keeping partial state"
                    );
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        if report.is_complete() {
            info!(
                entries = report.entries_replayed,
                batches = report.batches,
                "memtable recovered from WAL"
            );
        }
        report
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of distinct keys in the index
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Approximate index footprint in bytes
    pub fn size(&self) -> usize {
        self.index.read().size()
    }

    /// Whether the index has grown past `size_limit` bytes
    pub fn should_flush(&self, size_limit: usize) -> bool {
        let size = self.size();
        if size >= size_limit {
            warn!(size, size_limit, "memtable over size limit");
            return true;
        }
        false
    }

    /// The write-ahead log behind this memtable
    pub fn wal(&self) -> &Wal {
        &self.wal
    }
}
