//! Streamed batch reads
//!
//! `read_batch` hands the log over in fixed-size batches from a background
//! producer thread:
//!
//! ```text
//!  producer thread                       consumer
//!  ───────────────                       ────────
//!  lock WAL, seek(offset)
//!  read_next(batch_size)
//!  remember offset, unlock
//!  send(Ok(batch)) ──── rendezvous ────► next() -> Some(Ok(batch))
//!  ...
//!  send(Err(e))    ──────────────────►   next() -> Some(Err(e)), then None
//!  drop sender     ──────────────────►   next() -> None   (clean end of log)
//! ```
//!
//! The channel has no buffer, so the producer never runs ahead of the
//! consumer. The WAL lock is only held while a batch is being read, never
//! while waiting on the consumer.

use std::io::{Seek, SeekFrom};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error};

use crate::entry::Entry;
use crate::error::{ForgeError, Result};

use super::log::{Shared, Wal};

impl Wal {
    /// Stream the log from the start in batches of up to `batch_size` records
    ///
    /// Only non-empty batches are delivered. A read failure arrives as a
    /// final `Err` item; an exhausted stream with no `Err` means the whole
    /// log was read.
    ///
    /// Writing to the same WAL from the consuming thread while a stream is
    /// active is not supported.
    pub fn read_batch(&self, batch_size: usize) -> Result<BatchStream> {
        if batch_size == 0 {
            return Err(ForgeError::InvalidArgument(
                "batch size must be at least 1".to_string(),
            ));
        }
        if !self.is_open() {
            return Err(ForgeError::NilHandle);
        }

        let (sender, receiver) = channel::bounded(0);
        let shared = Arc::clone(&self.shared);
        let producer = thread::Builder::new()
            .name("wal-batch-reader".to_string())
            .spawn(move || produce(&shared, batch_size, &sender))
            .map_err(|e| ForgeError::io("failed to spawn WAL batch reader", e))?;

        Ok(BatchStream {
            receiver: Some(receiver),
            producer: Some(producer),
            failed: false,
        })
    }
}

/// Producer loop run on the background thread
fn produce(shared: &Shared, batch_size: usize, sender: &Sender<Result<Vec<Entry>>>) {
    let mut offset = 0u64;
    let mut batches = 0u64;

    loop {
        match shared.read_step(offset, batch_size) {
            Ok((entries, has_more, next_offset)) => {
                offset = next_offset;
                if !entries.is_empty() {
                    if sender.send(Ok(entries)).is_err() {
                        debug!(batches, "WAL batch stream dropped by consumer");
                        return;
                    }
                    batches += 1;
                }
                if !has_more {
                    debug!(batches, offset, "WAL batch stream exhausted");
                    return;
                }
            }
            Err(e) => {
                error!(error = %e, offset, "read wal failed");
                let _ = sender.send(Err(e));
                return;
            }
        }
    }
}

impl Shared {
    /// One locked step: seek to `offset`, read a batch, report the new offset
    fn read_step(&self, offset: u64, batch_size: usize) -> Result<(Vec<Entry>, bool, u64)> {
        let mut guard = self.handle.lock();
        let handle = guard.as_deref_mut().ok_or(ForgeError::NilHandle)?;

        handle
            .seek(SeekFrom::Start(offset))
            .map_err(|e| ForgeError::io("failed to seek WAL for batch read", e))?;
        let (entries, has_more) = self.read_next(handle, batch_size)?;
        let next_offset = handle
            .stream_position()
            .map_err(|e| ForgeError::io("failed to query WAL position", e))?;

        Ok((entries, has_more, next_offset))
    }
}

// =============================================================================
// BatchStream
// =============================================================================

/// Consumer side of a `read_batch` stream
///
/// Dropping it stops the producer and waits for its thread to exit.
pub struct BatchStream {
    receiver: Option<Receiver<Result<Vec<Entry>>>>,
    producer: Option<JoinHandle<()>>,
    failed: bool,
}

impl BatchStream {
    /// Drain the stream into a single vector, failing on the first error
    pub fn collect_entries(self) -> Result<Vec<Entry>> {
        let mut all = Vec::new();
        for batch in self {
            all.extend(batch?);
        }
        Ok(all)
    }
}

impl Iterator for BatchStream {
    type Item = Result<Vec<Entry>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.receiver.as_ref()?.recv().ok()?;
        self.failed = item.is_err();
        Some(item)
    }
}

impl Drop for BatchStream {
    fn drop(&mut self) {
        // Disconnect first so a producer blocked in send() returns
        self.receiver.take();
        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                error!("WAL batch reader thread panicked");
            }
        }
    }
}
