//! WAL handle and write path
//!
//! Owns the bound log handle and the injected services (codec, compressor,
//! buffer pool) shared by the write path, `read_all` and batch streams.

use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use bytes::BufMut;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::compress::Compressor;
use crate::entry::{BincodeCodec, Entry, EntryCodec};
use crate::error::{ForgeError, Result};
use crate::pool::BufferPool;

use super::handle::{open_log_file, LogHandle};

/// State shared between a [`Wal`] and its batch stream producers
pub(super) struct Shared {
    /// Bound handle; `None` once closed (or never bound)
    pub(super) handle: Mutex<Option<Box<dyn LogHandle>>>,
    pub(super) codec: Arc<dyn EntryCodec>,
    pub(super) compressor: Option<Arc<dyn Compressor>>,
    pub(super) pool: Arc<BufferPool>,
}

/// Append-only durable log of entries
///
/// ## Concurrency:
/// - A single mutex serializes `write`, `read_all`, `close` and every
///   step of a `read_batch` stream
/// - I/O runs while the lock is held; a stalled disk stalls all callers
/// - Cloning is cheap and yields another handle to the same log
#[derive(Clone)]
pub struct Wal {
    pub(super) shared: Arc<Shared>,
}

impl Wal {
    /// Open (or create) the log file at `path` with default services
    pub fn open(path: &Path) -> Result<Self> {
        let file = open_log_file(path)?;
        Ok(Self::builder().handle(file).build())
    }

    /// Create a WAL builder
    pub fn builder() -> WalBuilder {
        WalBuilder::default()
    }

    /// Append `entries` as one batch: one bulk write, one sync
    ///
    /// Returns the number of entries made durable. Nothing is retried; any
    /// failure aborts the rest of the batch.
    pub fn write(&self, entries: &[Entry]) -> Result<usize> {
        let mut guard = self.shared.handle.lock();
        let handle = guard.as_deref_mut().ok_or(ForgeError::NilHandle)?;

        if entries.is_empty() {
            return Ok(0);
        }

        handle
            .seek(SeekFrom::End(0))
            .map_err(|e| ForgeError::io("failed to seek to end of WAL", e))?;

        let mut buf = self.shared.pool.acquire();
        for entry in entries {
            // [length (i64 LE)][encoded entry]
            let data = self.shared.encode(entry)?;
            buf.put_i64_le(data.len() as i64);
            buf.put_slice(&data);
        }

        handle
            .write_all(&buf)
            .map_err(|e| ForgeError::io("failed to write WAL batch", e))?;
        handle
            .sync()
            .map_err(|e| ForgeError::io("failed to sync WAL", e))?;

        debug!(entries = entries.len(), bytes = buf.len(), "WAL batch committed");
        self.shared.pool.release(buf);

        Ok(entries.len())
    }

    /// Sync and unbind the handle. Later operations fail with `NilHandle`.
    pub fn close(&self) -> Result<()> {
        let handle = self.shared.handle.lock().take();
        match handle {
            Some(mut handle) => handle
                .sync()
                .map_err(|e| ForgeError::io("failed to sync WAL on close", e)),
            None => {
                warn!("close called on a WAL with no bound handle");
                Ok(())
            }
        }
    }

    /// Whether a handle is currently bound
    pub fn is_open(&self) -> bool {
        self.shared.handle.lock().is_some()
    }

    /// Whether values are compressed inside records
    pub fn compresses_values(&self) -> bool {
        self.shared.compressor.is_some()
    }
}

impl Shared {
    /// Entry → record payload (value compressed first when configured)
    pub(super) fn encode(&self, entry: &Entry) -> Result<Vec<u8>> {
        match &self.compressor {
            Some(compressor) => {
                let packed = Entry {
                    value: compressor.compress(&entry.value)?,
                    ..entry.clone()
                };
                self.codec.encode(&packed)
            }
            None => self.codec.encode(entry),
        }
    }

    /// Record payload → entry (value restored when configured)
    pub(super) fn decode(&self, data: &[u8]) -> Result<Entry> {
        let mut entry = self.codec.decode(data)?;
        if let Some(compressor) = &self.compressor {
            entry.value = compressor.decompress(&entry.value)?;
        }
        Ok(entry)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Wal`]
///
/// Every service is injected here; unset ones fall back to the bincode codec,
/// no compression and a private buffer pool.
#[derive(Default)]
pub struct WalBuilder {
    handle: Option<Box<dyn LogHandle>>,
    codec: Option<Arc<dyn EntryCodec>>,
    compressor: Option<Arc<dyn Compressor>>,
    pool: Option<Arc<BufferPool>>,
}

impl WalBuilder {
    /// Bind the log handle (a WAL built without one fails with `NilHandle`)
    pub fn handle(mut self, handle: impl LogHandle + 'static) -> Self {
        self.handle = Some(Box::new(handle));
        self
    }

    /// Set the entry codec
    pub fn codec(mut self, codec: Arc<dyn EntryCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Compress values with `compressor`
    pub fn compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Share a buffer pool
    pub fn pool(mut self, pool: Arc<BufferPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn build(self) -> Wal {
        Wal {
            shared: Arc::new(Shared {
                handle: Mutex::new(self.handle),
                codec: self
                    .codec
                    .unwrap_or_else(|| Arc::new(BincodeCodec) as Arc<dyn EntryCodec>),
                compressor: self.compressor,
                pool: self.pool.unwrap_or_default(),
            }),
        }
    }
}
