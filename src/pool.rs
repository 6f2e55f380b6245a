//! Byte buffer pool
//!
//! Reusable scratch buffers for framing WAL batches and reading record
//! payloads, so the hot path does not allocate per call.

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

/// Pool of reusable byte buffers
///
/// ## Concurrency:
/// - Backed by a bounded lock-free queue; `acquire`/`release` never block
/// - Buffers released while the pool is full are dropped
pub struct BufferPool {
    buffers: ArrayQueue<BytesMut>,
    initial_capacity: usize,
}

impl BufferPool {
    /// Default number of idle buffers kept
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Default byte capacity of a freshly allocated buffer
    pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024;

    /// Create a pool keeping at most `capacity` idle buffers
    pub fn new(capacity: usize, initial_capacity: usize) -> Self {
        Self {
            buffers: ArrayQueue::new(capacity.max(1)),
            initial_capacity,
        }
    }

    /// Take a buffer from the pool, or allocate one if it is empty
    pub fn acquire(&self) -> BytesMut {
        self.buffers
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.initial_capacity))
    }

    /// Return a buffer to the pool. It is cleared before reuse.
    pub fn release(&self, mut buf: BytesMut) {
        buf.clear();
        // Pool full: let the buffer drop
        let _ = self.buffers.push(buf);
    }

    /// Number of idle buffers currently pooled
    pub fn idle(&self) -> usize {
        self.buffers.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_BUFFER_SIZE)
    }
}
