//! Counting semaphore over a POSIX `sem_t`
//!
//! The pool posts once per accepted request and each worker waits once per
//! pickup, so the count always equals the number of items pending pickup
//! (observed under the queue mutex).

use reqpool_core::error::{PoolError, PoolResult};
use std::cell::UnsafeCell;

/// Counting semaphore (process-private)
///
/// `wait` blocks while the count is 0, then atomically decrements it.
/// `post` atomically increments it, waking exactly one blocked waiter per
/// post; no ordering is guaranteed among multiple waiters beyond that.
/// The count is a natural number and never goes negative.
pub struct Semaphore {
    // Boxed so the address sem_init registered stays stable across moves.
    handle: Box<UnsafeCell<libc::sem_t>>,
}

// Safety: sem_t is designed for cross-thread wait/post; we never hand out
// the raw handle.
unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// Create a semaphore with the given initial count
    pub fn new(initial: u32) -> PoolResult<Self> {
        let handle: Box<UnsafeCell<libc::sem_t>> =
            Box::new(UnsafeCell::new(unsafe { std::mem::zeroed() }));

        // pshared = 0: shared between threads of this process only
        let ret = unsafe { libc::sem_init(handle.get(), 0, initial) };
        if ret != 0 {
            return Err(PoolError::Platform(nix::errno::Errno::last_raw()));
        }

        Ok(Self { handle })
    }

    /// Block until the count is positive, then decrement it
    ///
    /// OS errors (including `EINTR` on signal delivery) are surfaced, not
    /// retried internally; the caller decides whether to re-wait.
    pub fn wait(&self) -> PoolResult<()> {
        let ret = unsafe { libc::sem_wait(self.handle.get()) };
        if ret != 0 {
            return Err(PoolError::Platform(nix::errno::Errno::last_raw()));
        }
        Ok(())
    }

    /// Increment the count, waking one blocked waiter if any
    pub fn post(&self) -> PoolResult<()> {
        let ret = unsafe { libc::sem_post(self.handle.get()) };
        if ret != 0 {
            return Err(PoolError::Platform(nix::errno::Errno::last_raw()));
        }
        Ok(())
    }

    /// Current count (racy snapshot; exact only under external locking)
    pub fn value(&self) -> PoolResult<i32> {
        let mut val: libc::c_int = 0;
        let ret = unsafe { libc::sem_getvalue(self.handle.get(), &mut val) };
        if ret != 0 {
            return Err(PoolError::Platform(nix::errno::Errno::last_raw()));
        }
        Ok(val)
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        // Destroying a semaphore with waiters is undefined at the POSIX
        // level; the pool only drops it after joining its workers.
        unsafe {
            libc::sem_destroy(self.handle.get());
        }
    }
}
