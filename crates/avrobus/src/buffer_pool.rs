//! Scratch buffer pool
//!
//! Encoding assembles each frame in a scratch buffer. Buffers are kept on a
//! bounded lock-free free list so that a busy encoder does not allocate per
//! message:
//!
//! ```text
//!   acquire() ──► PooledBuffer ──► (write header + body) ──► drop
//!       ▲                                                     │
//!       └──────────── clear() + try_send() ◄──────────────────┘
//! ```
//!
//! A buffer is owned by exactly one [`PooledBuffer`] at a time. Dropping the
//! handle clears the buffer and returns it, whichever way the caller exits.

use bytes::BytesMut;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Buffer pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferPoolConfig {
    /// Maximum number of idle buffers kept for reuse
    pub pool_size: usize,
    /// Initial capacity of newly allocated buffers
    pub buffer_capacity: usize,
    /// Buffers that grew beyond this are dropped instead of pooled
    pub max_retained_capacity: usize,
    /// Maintain [`PoolStats`] counters
    pub enable_tracking: bool,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 256,
            buffer_capacity: 1024,
            max_retained_capacity: 1024 * 1024,
            enable_tracking: true,
        }
    }
}

impl BufferPoolConfig {
    /// Configuration for high-throughput publishers
    pub fn high_throughput() -> Self {
        Self {
            pool_size: 4096,
            buffer_capacity: 4096,
            enable_tracking: false,
            ..Default::default()
        }
    }

    /// Configuration for low-memory environments
    pub fn low_memory() -> Self {
        Self {
            pool_size: 16,
            buffer_capacity: 256,
            max_retained_capacity: 64 * 1024,
            enable_tracking: true,
        }
    }
}

/// Buffer pool statistics
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Buffers handed out
    pub acquired: AtomicU64,
    /// Buffers given back (pooled or dropped)
    pub released: AtomicU64,
    /// Acquisitions that had to allocate
    pub misses: AtomicU64,
    /// Releases dropped because the pool was full or the buffer too large
    pub discarded: AtomicU64,
}

impl PoolStats {
    /// Buffers currently owned by callers
    pub fn outstanding(&self) -> u64 {
        let acquired = self.acquired.load(Ordering::Acquire);
        let released = self.released.load(Ordering::Acquire);
        acquired.saturating_sub(released)
    }

    /// Fraction of acquisitions served from the pool (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let acquired = self.acquired.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        if acquired == 0 {
            1.0
        } else {
            1.0 - (misses as f64 / acquired as f64)
        }
    }
}

/// Pool of reusable scratch buffers
pub struct BufferPool {
    free: (Sender<BytesMut>, Receiver<BytesMut>),
    config: BufferPoolConfig,
    stats: PoolStats,
}

impl BufferPool {
    pub fn new(config: BufferPoolConfig) -> Arc<Self> {
        // A zero-capacity crossbeam channel is a rendezvous channel, which
        // would never hold an idle buffer.
        let free = bounded(config.pool_size.max(1));
        Arc::new(Self {
            free,
            config,
            stats: PoolStats::default(),
        })
    }

    /// Take an empty buffer, allocating when none is idle
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buf = match self.free.1.try_recv() {
            Ok(buf) => buf,
            Err(_) => {
                if self.config.enable_tracking {
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                }
                BytesMut::with_capacity(self.config.buffer_capacity)
            }
        };
        if self.config.enable_tracking {
            self.stats.acquired.fetch_add(1, Ordering::AcqRel);
        }
        debug_assert!(buf.is_empty());

        PooledBuffer {
            inner: Some(buf),
            pool: Arc::clone(self),
        }
    }

    fn release(&self, mut buf: BytesMut) {
        if self.config.enable_tracking {
            self.stats.released.fetch_add(1, Ordering::AcqRel);
        }

        if buf.capacity() > self.config.max_retained_capacity {
            self.discard();
            return;
        }

        buf.clear();
        if self.free.0.try_send(buf).is_err() {
            self.discard();
        }
    }

    fn discard(&self) {
        if self.config.enable_tracking {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of idle buffers
    pub fn idle(&self) -> usize {
        self.free.1.len()
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle())
            .field("config", &self.config)
            .finish()
    }
}

/// Exclusive handle to a pooled buffer; returns it to the pool on drop
pub struct PooledBuffer {
    inner: Option<BytesMut>,
    pool: Arc<BufferPool>,
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.inner.take() {
            self.pool.release(buf);
        }
    }
}

impl std::ops::Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &Self::Target {
        // `inner` is only taken in `drop`
        self.inner.as_ref().expect("pooled buffer used after release")
    }
}

impl std::ops::DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut().expect("pooled buffer used after release")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;
    use std::collections::HashSet;
    use std::sync::Barrier;

    #[test]
    fn test_acquire_allocates_then_reuses() {
        let pool = BufferPool::new(BufferPoolConfig::default());

        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"hello world");
            assert_eq!(buf.len(), 11);
        }
        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.stats().misses.load(Ordering::Relaxed), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty(), "reused buffer must be cleared");
        assert_eq!(pool.stats().misses.load(Ordering::Relaxed), 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_release_on_early_return() {
        fn fails(pool: &Arc<BufferPool>) -> Result<(), &'static str> {
            let mut buf = pool.acquire();
            buf.put_u8(0);
            Err("write failed")
        }

        let pool = BufferPool::new(BufferPoolConfig::default());
        assert!(fails(&pool).is_err());
        assert_eq!(pool.stats().outstanding(), 0);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_full_pool_discards() {
        let pool = BufferPool::new(BufferPoolConfig {
            pool_size: 1,
            ..Default::default()
        });

        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);

        assert_eq!(pool.idle(), 1);
        assert_eq!(pool.stats().discarded.load(Ordering::Relaxed), 1);
        assert_eq!(pool.stats().outstanding(), 0);
    }

    #[test]
    fn test_oversized_buffers_not_retained() {
        let pool = BufferPool::new(BufferPoolConfig {
            max_retained_capacity: 64,
            buffer_capacity: 16,
            ..Default::default()
        });

        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(&[0u8; 1024]);
        }
        assert_eq!(pool.idle(), 0);
        assert_eq!(pool.stats().discarded.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_concurrent_acquire_never_shares_buffers() {
        const THREADS: usize = 16;
        let pool = BufferPool::new(BufferPoolConfig {
            pool_size: THREADS,
            ..Default::default()
        });
        // Warm the pool so that threads race for the same idle buffers.
        let warm: Vec<_> = (0..THREADS).map(|_| pool.acquire()).collect();
        drop(warm);

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let mut buf = pool.acquire();
                    let ptr = buf.as_ptr() as usize;
                    buf.put_u64(i as u64);
                    barrier.wait();
                    // Nobody else wrote into our buffer while we held it.
                    assert_eq!(&buf[..], &(i as u64).to_be_bytes());
                    ptr
                })
            })
            .collect();

        let ptrs: HashSet<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ptrs.len(), THREADS);
        assert_eq!(pool.stats().outstanding(), 0);
    }

    #[test]
    fn test_hit_rate() {
        let pool = BufferPool::new(BufferPoolConfig::default());
        drop(pool.acquire());
        drop(pool.acquire());
        assert!((pool.stats().hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
