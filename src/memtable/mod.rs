//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Log-before-apply: a write is visible to readers only once durable
//! - Single-writer/multi-reader access to the skip list index
//! - One-shot crash recovery by replaying the WAL
//! - Track size for flush triggers
//!
//! ## Write / Read / Recovery Paths
//! ```text
//!   set ──► WAL append + sync ──► SkipList::set
//!   get ──────────────────────► SkipList::get
//!   recovery ──► WAL::read_batch ──► SkipList::set (file order, once)
//! ```

mod recovery;
mod table;

pub use recovery::{RecoveryGuard, RecoveryReport, RecoveryState};
pub use table::MemTable;
