//! Skip List Module
//!
//! Ordered, mutable index over [`Entry`](crate::entry::Entry) records, sorted
//! by [`KeyOrder`](crate::key::KeyOrder).
//!
//! ## Responsibilities
//! - O(log n) expected point lookup and insert/update
//! - Ordered range scans and full enumeration (for a future flush)
//! - Approximate memory accounting for flush decisions
//!
//! ## Layout
//! Nodes live in an arena and link to each other by index. Slot 0 is the
//! head sentinel, which has one link per possible level.
//!
//! ```text
//! Level 3: HEAD ─────────► 3 ─────────────────► 9 ──────────► 21 ─► NIL
//! Level 2: HEAD ─────────► 3 ──► 6 ───────────► 9 ──► 19 ───► 21 ─► NIL
//! Level 1: HEAD ─────────► 3 ──► 6 ──► 7 ─────► 9 ──► 19 ───► 21 ─► NIL
//!
//! arena:  [HEAD][3][6][7][9][19][21]   (insertion order, never relocated)
//! ```

mod list;

pub use list::{Iter, SkipList};
