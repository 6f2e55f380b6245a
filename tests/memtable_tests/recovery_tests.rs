//! Recovery Tests
//!
//! Tests verify:
//! - Replaying the WAL rebuilds the index after a restart
//! - Recovery runs at most once per memtable, even under concurrency
//! - Writes arriving during a replay wait for it to finish
//! - Partial recovery on a corrupted log
//! - The run-once guard on its own

use std::fs::{self, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use forgekv::memtable::{RecoveryGuard, RecoveryState};
use forgekv::wal::LogHandle;
use forgekv::{Entry, MemTable, Wal};

use crate::common::{fresh_index, put, reopen, setup_memtable};

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_crash_replay_restores_latest_records() {
    let (_temp, path, memtable) = setup_memtable();
    memtable.set(put("k1", "v1", 1)).unwrap();
    memtable.set(put("k2", "v2", 2)).unwrap();
    memtable.delete("k1", 3).unwrap();
    drop(memtable);

    let restarted = reopen(&path);
    assert!(restarted.is_empty());
    restarted.recovery();

    assert_eq!(restarted.len(), 2);

    let k1 = restarted.get("k1").unwrap();
    assert!(k1.tombstone);
    assert_eq!(k1.version, 3);

    let k2 = restarted.get("k2").unwrap();
    assert_eq!(k2.value, b"v2");
    assert_eq!(k2.version, 2);

    let report = restarted.recovery_report().unwrap();
    assert!(report.is_complete());
    assert_eq!(report.entries_replayed, 3);
}

#[test]
fn test_recovery_of_empty_log() {
    let (_temp, _path, memtable) = setup_memtable();

    memtable.recovery();

    assert!(memtable.is_empty());
    assert_eq!(memtable.recovery_state(), RecoveryState::Done);
    assert_eq!(memtable.recovery_report().unwrap().entries_replayed, 0);
}

#[test]
fn test_recovery_in_small_batches() {
    let (_temp, path, memtable) = setup_memtable();
    for i in 0..25 {
        memtable.set(put(&format!("key{:02}", i), "v", i)).unwrap();
    }
    let before = memtable.all();
    drop(memtable);

    let restarted = MemTable::new(Wal::open(&path).unwrap(), fresh_index(), 4);
    restarted.recovery();

    let report = restarted.recovery_report().unwrap();
    assert_eq!(report.batches, 7);
    assert_eq!(report.entries_replayed, 25);
    assert_eq!(restarted.all(), before);
}

#[test]
fn test_writes_after_recovery_are_logged_and_replayed() {
    let (_temp, path, memtable) = setup_memtable();
    memtable.set(put("a", "1", 1)).unwrap();
    drop(memtable);

    let second = reopen(&path);
    second.recovery();
    second.set(put("b", "2", 2)).unwrap();
    drop(second);

    let third = reopen(&path);
    third.recovery();

    assert_eq!(third.len(), 2);
    assert_eq!(third.get("a").unwrap().value, b"1");
    assert_eq!(third.get("b").unwrap().value, b"2");
}

// =============================================================================
// Run-Once Tests
// =============================================================================

#[test]
fn test_recovery_is_idempotent() {
    let (_temp, path, memtable) = setup_memtable();
    memtable.set(put("k", "v", 1)).unwrap();
    drop(memtable);

    let restarted = reopen(&path);
    assert_eq!(restarted.recovery_state(), RecoveryState::NotStarted);
    assert!(restarted.recovery_report().is_none());

    restarted.recovery();
    let first = restarted.recovery_report().unwrap();

    // New records after the replay must not be double-applied or replayed
    restarted.set(put("later", "x", 2)).unwrap();
    restarted.recovery();
    restarted.recovery();

    assert_eq!(restarted.recovery_report().unwrap(), first);
    assert_eq!(restarted.len(), 2);
}

#[test]
fn test_concurrent_recovery_runs_once() {
    let (_temp, path, memtable) = setup_memtable();
    memtable.set(put("k1", "v1", 1)).unwrap();
    memtable.set(put("k2", "v2", 2)).unwrap();
    memtable.delete("k1", 3).unwrap();
    drop(memtable);

    let restarted = Arc::new(reopen(&path));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let mt = Arc::clone(&restarted);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                mt.recovery();
                // Every caller returns only after the replay finished
                assert_eq!(mt.recovery_state(), RecoveryState::Done);
                assert_eq!(mt.len(), 2);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(restarted.recovery_report().unwrap().entries_replayed, 3);
}

/// In-memory log whose reads block until its gate is opened
struct GatedLog {
    inner: Cursor<Vec<u8>>,
    gate: Arc<Gate>,
}

#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    fn pass(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
    }
}

impl Read for GatedLog {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.gate.pass();
        self.inner.read(buf)
    }
}

impl Write for GatedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for GatedLog {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl LogHandle for GatedLog {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

const GATED_RECORDS: usize = 2000;

/// Memtable over a log of `GATED_RECORDS` records, replayed one per batch,
/// whose replay stalls until the returned gate is opened
fn gated_memtable() -> (Arc<MemTable>, Arc<Gate>) {
    let (_temp, path, memtable) = setup_memtable();
    memtable
        .set_batch(
            (0..GATED_RECORDS)
                .map(|i| put(&format!("key{:04}", i), "v", i as i64))
                .collect(),
        )
        .unwrap();
    drop(memtable);

    let gate = Arc::new(Gate::default());
    let log = GatedLog {
        inner: Cursor::new(fs::read(&path).unwrap()),
        gate: Arc::clone(&gate),
    };
    let wal = Wal::builder().handle(log).build();

    (Arc::new(MemTable::new(wal, fresh_index(), 1)), gate)
}

/// Start `write` while recovery is running and check it only lands after
fn assert_write_waits_for_recovery<F>(write: F)
where
    F: FnOnce(&MemTable) + Send + 'static,
{
    let (memtable, gate) = gated_memtable();

    let recoverer = {
        let mt = Arc::clone(&memtable);
        thread::spawn(move || mt.recovery())
    };
    while memtable.recovery_state() != RecoveryState::Running {
        thread::yield_now();
    }

    let writer = {
        let mt = Arc::clone(&memtable);
        thread::spawn(move || {
            write(mt.as_ref());
            mt.recovery_state()
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!writer.is_finished());

    gate.open();
    recoverer.join().unwrap();

    // The write returned only once the replay was done
    assert_eq!(writer.join().unwrap(), RecoveryState::Done);

    // The replay saw only the records logged before it started
    let report = memtable.recovery_report().unwrap();
    assert!(report.is_complete());
    assert_eq!(report.entries_replayed, GATED_RECORDS as u64);
    assert_eq!(memtable.len(), GATED_RECORDS + 1);
    assert_eq!(memtable.get("late").unwrap().value, b"late");
}

#[test]
fn test_set_waits_for_running_recovery() {
    assert_write_waits_for_recovery(|mt| {
        mt.set(put("late", "late", 10_000)).unwrap();
    });
}

#[test]
fn test_set_batch_waits_for_running_recovery() {
    assert_write_waits_for_recovery(|mt| {
        mt.set_batch(vec![put("late", "late", 10_000)]).unwrap();
    });
}

// =============================================================================
// Partial Recovery Tests
// =============================================================================

#[test]
fn test_corrupted_tail_keeps_earlier_batches() {
    let (_temp, path, memtable) = setup_memtable();
    memtable
        .set_batch((0..6).map(|i| put(&format!("ok{}", i), "v", i)).collect())
        .unwrap();
    drop(memtable);

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&40i64.to_le_bytes()).unwrap();
    file.write_all(b"half").unwrap();
    drop(file);

    let restarted = MemTable::new(Wal::open(&path).unwrap(), fresh_index(), 3);
    restarted.recovery();

    // Both full batches survive, the broken record does not
    assert_eq!(restarted.len(), 6);
    assert_eq!(restarted.recovery_state(), RecoveryState::Done);

    let report = restarted.recovery_report().unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.entries_replayed, 6);
    assert!(report.error.unwrap().contains("corrupted"));
}

#[test]
fn test_recovery_with_closed_wal_reports_error() {
    let (_temp, _path, memtable) = setup_memtable();
    memtable.wal().close().unwrap();

    memtable.recovery();

    assert_eq!(memtable.recovery_state(), RecoveryState::Done);
    assert!(memtable.recovery_report().unwrap().error.is_some());
}

#[test]
fn test_recovery_from_compressed_log() {
    let temp = tempfile::TempDir::new().unwrap();
    let config = forgekv::Config::builder()
        .data_dir(temp.path())
        .wal_compression(true)
        .build();

    let memtable = MemTable::open(&config).unwrap();
    memtable.set(Entry::new("doc", vec![b'q'; 10_000], 1)).unwrap();
    drop(memtable);

    let restarted = MemTable::open(&config).unwrap();
    restarted.recovery();

    assert_eq!(restarted.get("doc").unwrap().value, vec![b'q'; 10_000]);
}

// =============================================================================
// RecoveryGuard Tests
// =============================================================================

#[test]
fn test_guard_runs_body_once() {
    let guard = RecoveryGuard::new();
    let calls = AtomicUsize::new(0);

    assert!(guard.run_once(|| {
        calls.fetch_add(1, Ordering::SeqCst);
    }));
    assert!(!guard.run_once(|| {
        calls.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(guard.state(), RecoveryState::Done);
}

#[test]
fn test_guard_wait_returns_immediately_when_idle() {
    let guard = RecoveryGuard::default();

    guard.wait();

    assert_eq!(guard.state(), RecoveryState::NotStarted);
}

#[test]
fn test_guard_reports_running_inside_body() {
    let guard = RecoveryGuard::new();

    guard.run_once(|| {
        assert_eq!(guard.state(), RecoveryState::Running);
    });
}

#[test]
fn test_guard_finishes_when_body_panics() {
    let guard = RecoveryGuard::new();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        guard.run_once(|| panic!("replay blew up"));
    }));

    assert!(result.is_err());
    assert_eq!(guard.state(), RecoveryState::Done);
    // Waiters are not stranded
    guard.wait();
}
