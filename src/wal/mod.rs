//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append framed entries before any index mutation
//! - One bulk write and one sync per batch
//! - Whole-log reads and streamed batched reads for crash recovery
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ Record 1                                  │
//! │ ┌──────────────────┬────────────────────┐ │
//! │ │ Length (8, i64LE)│ Encoded Entry (L)  │ │
//! │ └──────────────────┴────────────────────┘ │
//! ├───────────────────────────────────────────┤
//! │ Record 2                                  │
//! │ ┌──────────────────┬────────────────────┐ │
//! │ │ Length (8, i64LE)│ Encoded Entry (L)  │ │
//! │ └──────────────────┴────────────────────┘ │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Records are concatenated with no padding; the length must be > 0. The
//! file only ever grows. Records keep write order, never key order.

mod handle;
mod log;
mod reader;
mod stream;

pub use handle::{open_log_file, LogHandle};
pub use log::{Wal, WalBuilder};
pub use stream::BatchStream;

/// Size of the little-endian length prefix in front of every record
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Records read per step by `Wal::read_all`
pub const READ_ALL_BATCH_SIZE: usize = 1000;
