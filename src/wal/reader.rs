//! WAL Reader
//!
//! The shared chunked reader (`read_next`) and whole-log reads built on it.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

use bytes::BufMut;
use tracing::debug;

use crate::entry::Entry;
use crate::error::{ForgeError, Result};

use super::handle::LogHandle;
use super::log::{Shared, Wal};
use super::{LENGTH_PREFIX_SIZE, READ_ALL_BATCH_SIZE};

impl Wal {
    /// Read every record from the start of the log, in write order
    ///
    /// Any framing or I/O error aborts the whole read.
    pub fn read_all(&self) -> Result<Vec<Entry>> {
        let mut guard = self.shared.handle.lock();
        let handle = guard.as_deref_mut().ok_or(ForgeError::NilHandle)?;

        handle
            .seek(SeekFrom::Start(0))
            .map_err(|e| ForgeError::io("failed to seek to start of WAL", e))?;

        let mut all = Vec::new();
        loop {
            let (entries, has_more) = self.shared.read_next(handle, READ_ALL_BATCH_SIZE)?;
            all.extend(entries);
            if !has_more {
                break;
            }
        }

        debug!(entries = all.len(), "WAL read complete");
        Ok(all)
    }
}

impl Shared {
    /// Read up to `max_count` records from the handle's current position
    ///
    /// Returns the records and whether more may follow:
    /// - end of file exactly at a record boundary → `(records, false)`
    /// - `max_count` records read → `(records, true)`, the position is left
    ///   at the next record
    pub(super) fn read_next(
        &self,
        handle: &mut dyn LogHandle,
        max_count: usize,
    ) -> Result<(Vec<Entry>, bool)> {
        let mut entries = Vec::new();
        let mut buf = self.pool.acquire();

        for _ in 0..max_count {
            let len = match read_length(handle)? {
                Some(len) => len,
                None => {
                    self.pool.release(buf);
                    return Ok((entries, false));
                }
            };

            if len <= 0 {
                return Err(ForgeError::InvalidEntrySize(len));
            }
            let expected = len as u64;

            // No up-front reserve: a garbage length must not drive allocation
            buf.clear();
            let mut payload = Read::take(&mut *handle, expected);
            let actual = io::copy(&mut payload, &mut (&mut buf).writer())
                .map_err(|e| ForgeError::io("failed to read entry data", e))?;
            if actual != expected {
                return Err(ForgeError::CorruptedLog { expected, actual });
            }

            entries.push(self.decode(&buf)?);
        }

        self.pool.release(buf);
        Ok((entries, true))
    }
}

/// Read the 8-byte length prefix
///
/// `Ok(None)` means end of file with zero bytes read, i.e. a clean end at a
/// record boundary. A partially written prefix is corruption.
fn read_length(handle: &mut dyn LogHandle) -> Result<Option<i64>> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let mut filled = 0;

    while filled < LENGTH_PREFIX_SIZE {
        match handle.read(&mut prefix[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ForgeError::io("failed to read entry length", e)),
        }
    }

    match filled {
        0 => Ok(None),
        LENGTH_PREFIX_SIZE => Ok(Some(i64::from_le_bytes(prefix))),
        partial => Err(ForgeError::CorruptedLog {
            expected: LENGTH_PREFIX_SIZE as u64,
            actual: partial as u64,
        }),
    }
}
