//! Bounded pool of reusable byte buffers
//!
//! The pool is a fixed-capacity free list shared by every pipeline stage.
//! Both operations are non-blocking: `get` returns `None` when the pool is
//! empty (the caller allocates instead) and `put` discards the buffer when the
//! pool is full. A stage that holds upstream back-pressure can therefore always
//! recycle without risking a deadlock.
//!
//! Buffers handed out by [`BufferPool::acquire`] are wrapped in [`PooledBuf`],
//! which returns itself to the pool when dropped. Ownership of a `PooledBuf`
//! moves along the pipeline channels, so every buffer leaves each stage exactly
//! once: either sent downstream or released on drop.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;
use serde::{Deserialize, Serialize};

/// Counters describing how buffers moved through the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Buffers handed out from the free list
    pub reused: u64,
    /// Buffers freshly allocated because the free list was empty
    pub allocated: u64,
    /// Buffers put back on the free list
    pub returned: u64,
    /// Buffers dropped because the pool was full or closed
    pub discarded: u64,
    /// Maximum number of idle buffers the pool retains
    pub capacity: usize,
    /// Most idle buffers ever held at once
    pub peak_idle: usize,
}

impl PoolStats {
    /// Buffers acquired but not yet released
    pub fn outstanding(&self) -> u64 {
        (self.reused + self.allocated).saturating_sub(self.returned + self.discarded)
    }
}

#[derive(Debug)]
struct PoolInner {
    free: ArrayQueue<Vec<u8>>,
    fresh_capacity: usize,
    closed: AtomicBool,
    reused: AtomicU64,
    allocated: AtomicU64,
    returned: AtomicU64,
    discarded: AtomicU64,
    peak_idle: AtomicUsize,
}

/// Fixed-capacity ring of reusable byte buffers
///
/// Cloning the pool is cheap; all clones share the same free list.
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Create a pool holding at most `capacity` idle buffers.
    ///
    /// Buffers allocated on a miss start with `fresh_capacity` bytes of
    /// capacity. Both values are raised to at least one.
    pub fn new(capacity: usize, fresh_capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                free: ArrayQueue::new(capacity.max(1)),
                fresh_capacity: fresh_capacity.max(1),
                closed: AtomicBool::new(false),
                reused: AtomicU64::new(0),
                allocated: AtomicU64::new(0),
                returned: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
                peak_idle: AtomicUsize::new(0),
            }),
        }
    }

    /// Maximum number of idle buffers the pool retains
    pub fn capacity(&self) -> usize {
        self.inner.free.capacity()
    }

    /// Number of idle buffers currently in the pool
    pub fn idle(&self) -> usize {
        self.inner.free.len()
    }

    /// Remove and return an idle buffer, or `None` if the pool is empty or closed
    pub fn get(&self) -> Option<Vec<u8>> {
        if self.is_closed() {
            return None;
        }
        let buf = self.inner.free.pop()?;
        self.inner.reused.fetch_add(1, Ordering::Relaxed);
        Some(buf)
    }

    /// Return a buffer to the pool
    ///
    /// The buffer's length is reset to zero and its capacity kept. If the pool
    /// is full, closed, or the buffer never allocated, it is dropped instead.
    pub fn put(&self, mut buf: Vec<u8>) {
        if self.is_closed() || buf.capacity() == 0 {
            self.inner.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        buf.clear();
        match self.inner.free.push(buf) {
            Ok(()) => {
                self.inner.returned.fetch_add(1, Ordering::Relaxed);
                self.inner
                    .peak_idle
                    .fetch_max(self.inner.free.len(), Ordering::Relaxed);
            }
            Err(_) => {
                self.inner.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Take a buffer from the pool, allocating a fresh one on a miss
    pub fn acquire(&self) -> PooledBuf {
        let buf = self.get().unwrap_or_else(|| {
            self.inner.allocated.fetch_add(1, Ordering::Relaxed);
            Vec::with_capacity(self.inner.fresh_capacity)
        });
        PooledBuf {
            buf,
            pool: self.clone(),
        }
    }

    /// Close the pool: idle buffers are freed and later `put`s drop silently
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        while self.inner.free.pop().is_some() {}
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            reused: self.inner.reused.load(Ordering::Relaxed),
            allocated: self.inner.allocated.load(Ordering::Relaxed),
            returned: self.inner.returned.load(Ordering::Relaxed),
            discarded: self.inner.discarded.load(Ordering::Relaxed),
            capacity: self.capacity(),
            peak_idle: self.inner.peak_idle.load(Ordering::Relaxed),
        }
    }
}

/// A byte buffer on loan from a [`BufferPool`]
///
/// Dereferences to `Vec<u8>`. Dropping it puts the buffer back in its pool.
#[derive(Debug)]
pub struct PooledBuf {
    buf: Vec<u8>,
    pool: BufferPool,
}

impl Deref for PooledBuf {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}
