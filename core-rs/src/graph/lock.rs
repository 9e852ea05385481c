//! Re-entrant write lock with an acquisition level
//!
//! Advisory only: it serializes writers going through this process. Atomicity
//! on the store side comes from sending related updates in one request.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct WriteLock {
    mutex: ReentrantMutex<()>,
    level: AtomicUsize,
}

/// Held write lock; releases one level on drop
pub struct WriteGuard<'a> {
    level: &'a AtomicUsize,
    _guard: ReentrantMutexGuard<'a, ()>,
}

impl WriteLock {
    pub fn new() -> Self {
        Self {
            mutex: ReentrantMutex::new(()),
            level: AtomicUsize::new(0),
        }
    }

    /// Acquire (or re-enter) the lock
    pub fn acquire(&self) -> WriteGuard<'_> {
        let guard = self.mutex.lock();
        self.level.fetch_add(1, Ordering::SeqCst);
        WriteGuard { level: &self.level, _guard: guard }
    }

    /// Current number of nested acquisitions
    pub fn level(&self) -> usize {
        self.level.load(Ordering::SeqCst)
    }
}

impl Default for WriteLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        // runs before `_guard` is released
        self.level.fetch_sub(1, Ordering::SeqCst);
    }
}
