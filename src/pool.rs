//! Fixed-size pool of handler instances.
//!
//! Each resource owns one pool, sized once at registration. Instances are
//! interchangeable slots; a slot serves one request at a time. Callers that
//! outrun the pool wait on a tokio semaphore.
//!
//! Slot assignment is the only mutable shared state on the request path:
//! a round-robin cursor picks where to start looking and a per-slot atomic
//! flag is claimed with compare-exchange, so a busy slot is never handed out
//! twice.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct Slot {
    busy: AtomicBool,
    served: AtomicU64,
}

/// A fixed set of equivalent handler instances.
#[derive(Debug)]
pub struct HandlerPool {
    slots: Box<[Slot]>,
    permits: Arc<Semaphore>,
    cursor: AtomicUsize,
}

impl HandlerPool {
    /// Creates a pool with `size` slots. A size of zero is raised to one so
    /// the pool can always make progress.
    pub fn new(size: usize) -> Arc<Self> {
        let size = size.max(1);
        Arc::new(Self {
            slots: (0..size).map(|_| Slot::default()).collect(),
            permits: Arc::new(Semaphore::new(size)),
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots not currently serving a request.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Requests served so far by the instance at `index`.
    pub fn served(&self, index: usize) -> Option<u64> {
        self.slots.get(index).map(|s| s.served.load(Ordering::Relaxed))
    }

    /// Waits for a free instance and claims it.
    pub async fn acquire(self: &Arc<Self>) -> PooledHandler {
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            // The semaphore lives as long as the pool and is never closed.
            Err(_) => unreachable!("handler pool semaphore closed"),
        };
        self.claim(permit)
    }

    /// Claims a free instance without waiting.
    pub fn try_acquire(self: &Arc<Self>) -> Option<PooledHandler> {
        let permit = Arc::clone(&self.permits).try_acquire_owned().ok()?;
        Some(self.claim(permit))
    }

    fn claim(self: &Arc<Self>, permit: OwnedSemaphorePermit) -> PooledHandler {
        // Holding a permit guarantees a free slot exists, but a concurrent
        // release-and-claim can move it behind our scan; go round again.
        loop {
            let len = self.slots.len();
            // The cursor wraps at usize::MAX; reduce it before adding.
            let start = self.cursor.fetch_add(1, Ordering::Relaxed) % len;
            for i in 0..len {
                let index = (start + i) % len;
                let slot = &self.slots[index];
                if slot.busy
                    .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
                {
                    slot.served.fetch_add(1, Ordering::Relaxed);
                    return PooledHandler { pool: Arc::clone(self), index, _permit: permit };
                }
            }
            std::hint::spin_loop();
        }
    }
}

/// A claimed instance. Dropping it returns the slot to the pool.
#[derive(Debug)]
pub struct PooledHandler {
    pool: Arc<HandlerPool>,
    index: usize,
    // Released after `drop` clears the busy flag, so a waiter woken by the
    // permit always finds a free slot.
    _permit: OwnedSemaphorePermit,
}

impl PooledHandler {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for PooledHandler {
    fn drop(&mut self) {
        self.pool.slots[self.index].busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;

    #[test]
    fn zero_size_is_clamped() {
        assert_eq!(HandlerPool::new(0).size(), 1);
    }

    #[test]
    fn busy_instances_are_never_shared() {
        let pool = HandlerPool::new(3);
        let held: Vec<_> = (0..3).map(|_| pool.try_acquire().unwrap()).collect();

        let indices: HashSet<_> = held.iter().map(PooledHandler::index).collect();
        assert_eq!(indices.len(), 3);
        assert!(pool.try_acquire().is_none());
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn dropping_returns_the_slot() {
        let pool = HandlerPool::new(1);
        let first = pool.try_acquire().unwrap();
        assert!(pool.try_acquire().is_none());
        drop(first);

        let second = pool.try_acquire().unwrap();
        assert_eq!(second.index(), 0);
        assert_eq!(pool.served(0), Some(2));
    }

    #[test]
    fn rotates_through_free_slots() {
        let pool = HandlerPool::new(2);
        let a = pool.try_acquire().unwrap().index();
        let b = pool.try_acquire().unwrap().index();
        assert_ne!(a, b);
    }

    #[test]
    fn cursor_wraps_without_overflow() {
        let pool = HandlerPool::new(3);
        pool.cursor.store(usize::MAX, Ordering::Relaxed);

        let held: Vec<_> = (0..3).map(|_| pool.try_acquire().unwrap()).collect();
        let indices: HashSet<_> = held.iter().map(PooledHandler::index).collect();
        assert_eq!(indices.len(), 3);
        assert_eq!(pool.cursor.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn acquire_waits_for_a_release() {
        let pool = HandlerPool::new(1);
        let held = pool.acquire().await;

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire().await.index() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        assert_eq!(waiter.await.unwrap(), 0);
    }
}
