//! SkipList implementation
//!
//! Arena-backed skip list. Not internally synchronized: `set` takes
//! `&mut self`, so callers provide reader/writer exclusion (the memtable wraps
//! it in an `RwLock`).

use std::cmp::Ordering;
use std::mem;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::entry::Entry;
use crate::key::compare_keys;

/// Arena slot of the head sentinel
const HEAD: usize = 0;

/// Forward link to another arena slot (`None` = end of level)
type Link = Option<usize>;

/// A node: one owned record plus its forward links
#[derive(Debug)]
struct Element {
    entry: Entry,
    next: Vec<Link>,
}

/// Probabilistic ordered index
pub struct SkipList {
    /// Arena of nodes, `nodes[HEAD]` is the sentinel
    nodes: Vec<Element>,
    /// Configured maximum height
    max_level: usize,
    /// Promotion probability
    p: f64,
    /// Highest level currently occupied (>= 1)
    level: usize,
    /// Per-list generator so separate lists never contend on shared state
    rng: StdRng,
    /// Approximate footprint in bytes
    size: usize,
    /// Number of records
    count: usize,
}

impl SkipList {
    /// Create an empty list seeded from OS entropy
    ///
    /// # Panics
    /// If `max_level` is 0 or `p` is outside `(0, 1)`.
    pub fn new(max_level: usize, p: f64) -> Self {
        Self::with_rng(max_level, p, StdRng::from_entropy())
    }

    /// Create an empty list with a deterministic level generator
    pub fn with_seed(max_level: usize, p: f64, seed: u64) -> Self {
        Self::with_rng(max_level, p, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_level: usize, p: f64, rng: StdRng) -> Self {
        assert!(max_level >= 1, "max_level must be at least 1");
        assert!(p > 0.0 && p < 1.0, "p must be in (0, 1), got {}", p);

        let head = Element {
            entry: Entry::default(),
            next: vec![None; max_level],
        };

        Self {
            nodes: vec![head],
            max_level,
            p,
            level: 1,
            rng,
            size: 0,
            count: 0,
        }
    }

    /// A fresh empty list with the same parameters; this one is left as is
    pub fn reset(&self) -> Self {
        Self::new(self.max_level, self.p)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert `entry`, or overwrite the record already stored under an equal key
    ///
    /// An overwrite replaces value, tombstone and version in place; the node
    /// keeps its key, height and arena slot, and `len()` does not change.
    pub fn set(&mut self, entry: Entry) {
        let mut update = vec![HEAD; self.max_level];
        let mut curr = HEAD;

        for lvl in (0..self.level).rev() {
            curr = self.advance(curr, lvl, &entry.key);
            update[lvl] = curr;
        }

        if let Some(next) = self.nodes[curr].next[0] {
            if compare_keys(&self.nodes[next].entry.key, &entry.key) == Ordering::Equal {
                let stored = &mut self.nodes[next].entry;
                self.size = self.size + entry.value.len() - stored.value.len();
                stored.value = entry.value;
                stored.tombstone = entry.tombstone;
                stored.version = entry.version;
                return;
            }
        }

        let height = self.random_level();
        if height > self.level {
            // update[self.level..height] already points at HEAD
            self.level = height;
        }

        let idx = self.nodes.len();
        let next: Vec<Link> = (0..height).map(|lvl| self.nodes[update[lvl]].next[lvl]).collect();

        self.size += footprint(&entry, height);
        self.nodes.push(Element { entry, next });

        for (lvl, &pred) in update.iter().enumerate().take(height) {
            self.nodes[pred].next[lvl] = Some(idx);
        }
        self.count += 1;
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Find the record stored under a key equal to `key`
    ///
    /// Equality is [`KeyOrder`](crate::key::KeyOrder) equality: same prefix
    /// and same parsed timestamp. `a@5` and `a@05` therefore name the same
    /// record, and the stored key is whichever spelling was inserted first.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        let node = self.nodes[self.seek(key)].next[0]?;
        let entry = &self.nodes[node].entry;
        (compare_keys(&entry.key, key) == Ordering::Equal).then_some(entry)
    }

    /// Records with `start <= key <= end`, in order
    pub fn scan(&self, start: &str, end: &str) -> Vec<&Entry> {
        let first = self.nodes[self.seek(start)].next[0];
        Iter { list: self, next: first }
            .take_while(|entry| compare_keys(&entry.key, end) != Ordering::Greater)
            .collect()
    }

    /// Every record in ascending key order
    pub fn all(&self) -> Vec<&Entry> {
        let mut all = Vec::with_capacity(self.count);
        all.extend(self.iter());
        all
    }

    /// Level-0 iterator over all records
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            next: self.nodes[HEAD].next[0],
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Approximate memory footprint in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Highest level currently in use
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn probability(&self) -> f64 {
        self.p
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Last node at `lvl` (starting from `from`) whose key is < `key`
    fn advance(&self, mut from: usize, lvl: usize, key: &str) -> usize {
        while let Some(next) = self.nodes[from].next[lvl] {
            if compare_keys(&self.nodes[next].entry.key, key) != Ordering::Less {
                break;
            }
            from = next;
        }
        from
    }

    /// Level-0 predecessor of the first node whose key is >= `key`
    fn seek(&self, key: &str) -> usize {
        (0..self.level)
            .rev()
            .fold(HEAD, |curr, lvl| self.advance(curr, lvl, key))
    }

    /// Geometric height: P(height >= k) = p^(k-1), capped at max_level
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.gen::<f64>() < self.p {
            level += 1;
        }
        level
    }
}

/// Bytes charged for a freshly linked node of the given height
fn footprint(entry: &Entry, height: usize) -> usize {
    entry.key.len()
        + entry.value.len()
        + mem::size_of::<bool>()
        + mem::size_of::<i64>()
        + height * mem::size_of::<Link>()
}

impl<'a> IntoIterator for &'a SkipList {
    type Item = &'a Entry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over skip list records in key order
pub struct Iter<'a> {
    list: &'a SkipList,
    next: Link,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let list: &'a SkipList = self.list;
        let node = &list.nodes[self.next?];
        self.next = node.next[0];
        Some(&node.entry)
    }
}
