//! Log handles
//!
//! The WAL never creates, renames or deletes files. It is handed a seekable,
//! appendable, syncable handle that a caller opened beforehand.

use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::Path;

use crate::error::{ForgeError, Result};

/// Byte-addressable resource a WAL can append to and replay from
pub trait LogHandle: Read + Write + Seek + Send {
    /// Make everything written so far durable
    fn sync(&mut self) -> io::Result<()>;
}

impl LogHandle for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// In-memory log, mostly useful for tests and tooling
impl LogHandle for Cursor<Vec<u8>> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: LogHandle + ?Sized> LogHandle for Box<T> {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

/// Open (or create) a log file for appending and replay
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| ForgeError::io(format!("failed to open WAL file {}", path.display()), e))
}
