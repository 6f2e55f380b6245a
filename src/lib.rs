//! # ForgeKV
//!
//! The in-memory write path of a log-structured-merge storage engine:
//! - Skip list memtable ordered by versioned keys
//! - Write-Ahead Logging (WAL) for durability, one sync per batch
//! - Crash recovery by replaying the WAL, at most once per memtable
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Callers                             │
//! │                 (set / get / recovery)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       MemTable                              │
//! │            (RwLock, run-once recovery guard)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  SkipList   │
//!   │  (Append)   │          │  (Arena)    │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │  LogHandle  │
//!   │ (File, ...) │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod key;
pub mod entry;
pub mod pool;
pub mod compress;

pub mod skiplist;
pub mod wal;
pub mod memtable;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ForgeError, Result};
pub use config::Config;
pub use entry::{BincodeCodec, Entry, EntryCodec};
pub use key::{compare_keys, KeyOrder};
pub use skiplist::SkipList;
pub use wal::Wal;
pub use memtable::MemTable;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ForgeKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
