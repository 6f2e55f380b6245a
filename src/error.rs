//! Error types for ForgeKV
//!
//! Provides a unified error type for the WAL, the skip list index and the
//! memtable that coordinates them.

use std::io;

use thiserror::Error;

/// Result type alias using ForgeError
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Unified error type for ForgeKV operations
#[derive(Debug, Error)]
pub enum ForgeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("fd must not be nil")]
    NilHandle,

    #[error("invalid entry size: non-positive length {0}")]
    InvalidEntrySize(i64),

    #[error("WAL file is corrupted: incomplete entry data, expected {expected} bytes, got {actual}")]
    CorruptedLog { expected: u64, actual: u64 },

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Compression error: {0}")]
    Compression(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ForgeError {
    /// Wrap an I/O error with a short description of what was being done
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        ForgeError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for the framing and truncation errors that make a log unreadable
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            ForgeError::InvalidEntrySize(_) | ForgeError::CorruptedLog { .. }
        )
    }
}
