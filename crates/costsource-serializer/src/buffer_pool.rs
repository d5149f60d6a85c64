//! Reusable byte buffers for the streaming emitter (spec.md §4.5, §5
//! "Buffer pool (emitter)").
//!
//! Buffers above [`BufferPool::MAX_CAPACITY`] are discarded rather than
//! returned, so one oversized record can't make the pool itself grow
//! without bound. Every buffer is cleared on both acquire and release —
//! defense-in-depth against a stale record leaking into the next one.

use parking_lot::Mutex;

/// A buffer checked out of a [`BufferPool`]. Returns itself to the pool
/// on drop.
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl<'a> PooledBuffer<'a> {
    pub fn as_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        let taken = std::mem::take(&mut self.buf);
        self.pool.release(taken);
    }
}

/// Concurrency-safe pool of reusable `Vec<u8>` buffers, capped at 64KiB
/// per buffer.
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub const MAX_CAPACITY: usize = 64 * 1024;

    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Checks out a cleared buffer, reusing one from the pool when
    /// available.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut buf = self.free.lock().pop().unwrap_or_default();
        buf.clear();
        PooledBuffer { buf, pool: self }
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > Self::MAX_CAPACITY {
            return;
        }
        buf.clear();
        self.free.lock().push(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_buffer_is_reused() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.as_mut().extend_from_slice(b"hello");
        }
        let buf = pool.acquire();
        assert!(buf.as_slice().is_empty(), "buffer must be cleared on acquire");
        assert_eq!(pool.free.lock().len(), 0);
    }

    #[test]
    fn oversized_buffer_is_discarded_not_pooled() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.as_mut().resize(BufferPool::MAX_CAPACITY + 1, 0);
        }
        assert_eq!(pool.free.lock().len(), 0);
    }

    #[test]
    fn within_capacity_buffer_is_retained() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.as_mut().resize(1024, 0);
        }
        assert_eq!(pool.free.lock().len(), 1);
    }
}
