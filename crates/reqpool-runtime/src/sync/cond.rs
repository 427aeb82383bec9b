//! Condition variable over a `pthread_cond_t`
//!
//! Not exercised by the pool's own dispatch loop; collaborators that share
//! the native-handle lifecycle discipline (connection pools, timer
//! subsystems) need wait/notify with timeout, and it composes with
//! [`Mutex`] through the exposed pthread handle.

use super::mutex::MutexGuard;
use reqpool_core::error::{PoolError, PoolResult};
use std::cell::UnsafeCell;
use std::time::Duration;

const NANOS_PER_SEC: libc::c_long = 1_000_000_000;

/// Condition variable
///
/// `wait` and `wait_timeout` consume the guard (the pthread call releases
/// the mutex while blocked) and hand back a guard for the re-acquired
/// mutex. `signal` wakes at most one waiter, `broadcast` wakes all.
pub struct Condvar {
    handle: Box<UnsafeCell<libc::pthread_cond_t>>,
}

// Safety: pthread_cond_t is designed for cross-thread wait/signal
unsafe impl Send for Condvar {}
unsafe impl Sync for Condvar {}

impl Condvar {
    pub fn new() -> PoolResult<Self> {
        let handle: Box<UnsafeCell<libc::pthread_cond_t>> =
            Box::new(UnsafeCell::new(unsafe { std::mem::zeroed() }));

        let ret = unsafe { libc::pthread_cond_init(handle.get(), std::ptr::null()) };
        if ret != 0 {
            return Err(PoolError::Platform(ret));
        }

        Ok(Self { handle })
    }

    /// Atomically release the mutex and block until signaled, re-acquiring
    /// the mutex before returning
    ///
    /// Spurious wakeups are possible; callers re-check their predicate in a
    /// loop as usual.
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> PoolResult<MutexGuard<'a, T>> {
        let mutex = guard.mutex();
        // The guard is reconstructed below; pthread re-acquires the mutex
        // for us, so the old guard must not run its unlock.
        std::mem::forget(guard);

        let ret = unsafe { libc::pthread_cond_wait(self.handle.get(), mutex.native_handle()) };
        if ret != 0 {
            // The mutex is re-acquired even on error paths we could hit
            // here; hand ownership back before reporting.
            unsafe { libc::pthread_mutex_unlock(mutex.native_handle()) };
            return Err(PoolError::Platform(ret));
        }

        // Safety: pthread_cond_wait returned with the mutex held
        Ok(unsafe { mutex.guard_unchecked() })
    }

    /// Like [`wait`](Self::wait), with a relative timeout
    ///
    /// The second tuple element is `true` if the timeout elapsed before a
    /// signal; timing out is not an error.
    pub fn wait_timeout<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout: Duration,
    ) -> PoolResult<(MutexGuard<'a, T>, bool)> {
        let deadline = deadline_from_now(timeout)?;

        let mutex = guard.mutex();
        std::mem::forget(guard);

        let ret = unsafe {
            libc::pthread_cond_timedwait(self.handle.get(), mutex.native_handle(), &deadline)
        };
        if ret != 0 && ret != libc::ETIMEDOUT {
            unsafe { libc::pthread_mutex_unlock(mutex.native_handle()) };
            return Err(PoolError::Platform(ret));
        }

        // Safety: pthread_cond_timedwait returned with the mutex held
        let guard = unsafe { mutex.guard_unchecked() };
        Ok((guard, ret == libc::ETIMEDOUT))
    }

    /// Wake at most one waiter
    pub fn signal(&self) -> PoolResult<()> {
        let ret = unsafe { libc::pthread_cond_signal(self.handle.get()) };
        if ret != 0 {
            return Err(PoolError::Platform(ret));
        }
        Ok(())
    }

    /// Wake all waiters
    pub fn broadcast(&self) -> PoolResult<()> {
        let ret = unsafe { libc::pthread_cond_broadcast(self.handle.get()) };
        if ret != 0 {
            return Err(PoolError::Platform(ret));
        }
        Ok(())
    }
}

impl Drop for Condvar {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_cond_destroy(self.handle.get());
        }
    }
}

/// Absolute CLOCK_REALTIME deadline `timeout` from now, as pthread expects
fn deadline_from_now(timeout: Duration) -> PoolResult<libc::timespec> {
    let mut now = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let ret = unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) };
    if ret != 0 {
        return Err(PoolError::Platform(nix::errno::Errno::last_raw()));
    }

    let mut sec = now.tv_sec.saturating_add(timeout.as_secs() as libc::time_t);
    let mut nsec = now.tv_nsec + timeout.subsec_nanos() as libc::c_long;
    if nsec >= NANOS_PER_SEC {
        sec = sec.saturating_add(1);
        nsec -= NANOS_PER_SEC;
    }

    Ok(libc::timespec {
        tv_sec: sec,
        tv_nsec: nsec,
    })
}
