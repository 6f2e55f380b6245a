//! Recovery guard
//!
//! Run-once gate for WAL replay:
//!
//! ```text
//! NotStarted ──(first caller wins CAS)──► Running ──(body returns)──► Done
//! ```
//!
//! Callers that lose the race block until `Done`. The transition to `Done`
//! also happens if the body panics, so waiters are never stranded.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::{Condvar, Mutex};

const NOT_STARTED: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;

/// Observable state of a [`RecoveryGuard`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    NotStarted,
    Running,
    Done,
}

/// Outcome of a memtable replay, kept for out-of-band inspection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records applied to the index
    pub entries_replayed: u64,

    /// Batches received from the WAL stream
    pub batches: u64,

    /// Why the replay stopped early, if it did
    pub error: Option<String>,
}

impl RecoveryReport {
    /// True when the whole log was replayed
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Tri-state run-once gate
#[derive(Debug)]
pub struct RecoveryGuard {
    state: AtomicU8,
    lock: Mutex<()>,
    done: Condvar,
}

impl RecoveryGuard {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(NOT_STARTED),
            lock: Mutex::new(()),
            done: Condvar::new(),
        }
    }

    /// Run `body` if nobody has yet; otherwise wait until the run finished
    ///
    /// Returns `true` only for the caller that executed `body`.
    pub fn run_once<F: FnOnce()>(&self, body: F) -> bool {
        if self
            .state
            .compare_exchange(NOT_STARTED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.wait();
            return false;
        }

        let _finish = FinishOnDrop(self);
        body();
        true
    }

    /// Block while a run is in progress. Returns at once otherwise.
    pub fn wait(&self) {
        let mut guard = self.lock.lock();
        while self.state.load(Ordering::Acquire) == RUNNING {
            self.done.wait(&mut guard);
        }
    }

    pub fn state(&self) -> RecoveryState {
        match self.state.load(Ordering::Acquire) {
            NOT_STARTED => RecoveryState::NotStarted,
            RUNNING => RecoveryState::Running,
            _ => RecoveryState::Done,
        }
    }

    fn finish(&self) {
        // Store under the lock so a waiter cannot miss the notification
        let _guard = self.lock.lock();
        self.state.store(DONE, Ordering::Release);
        self.done.notify_all();
    }
}

impl Default for RecoveryGuard {
    fn default() -> Self {
        Self::new()
    }
}

struct FinishOnDrop<'a>(&'a RecoveryGuard);

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}
