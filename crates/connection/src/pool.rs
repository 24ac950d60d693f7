//! Block-sized buffer pool for the incoming-Request hot path (§4.4, §9).
//!
//! A free list, not a fixed-capacity pool: it only ever grows, bounded in
//! practice by the peer's request concurrency. Buffers are handed back
//! through the writer's drain signal, never before the bytes have actually
//! left the writer — returning one earlier would risk the writer still
//! serializing from it while a new request reuses it.

use std::sync::Mutex;

use protocol::constants::BLOCK_SIZE;

/// A pooled, block-sized buffer. Dropping it without returning it to the
/// pool simply deallocates — the pool never depends on `Drop` to reclaim.
pub type PooledBuffer = Vec<u8>;

/// Thread-safe free list of [`BLOCK_SIZE`]-byte buffers.
#[derive(Debug, Default)]
pub struct BlockPool {
    free: Mutex<Vec<PooledBuffer>>,
}

impl BlockPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a buffer sized and zeroed to full capacity ([`BLOCK_SIZE`]),
    /// reused from the free list when available.
    #[must_use]
    pub fn acquire(&self) -> PooledBuffer {
        let mut buf = self.free.lock().unwrap().pop().unwrap_or_default();
        buf.clear();
        buf.resize(BLOCK_SIZE, 0);
        buf
    }

    /// Returns `buf` to the free list for reuse.
    pub fn release(&self, buf: PooledBuffer) {
        self.free.lock().unwrap().push(buf);
    }

    /// Number of buffers currently idle in the free list. Exposed for tests.
    #[cfg(test)]
    fn idle_count(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}
