//! Mutual exclusion over a `pthread_mutex_t`
//!
//! Guard-based: `lock` returns a [`MutexGuard`] that unlocks on drop, so
//! lock/unlock are always paired and the payload is only reachable while
//! the lock is held. The native handle stays exposed so a [`Condvar`]
//! can be composed with it.
//!
//! [`Condvar`]: super::Condvar

use reqpool_core::error::{PoolError, PoolResult};
use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// A non-reentrant mutex protecting a value of type `T`
///
/// Built on the default pthread mutex: re-locking from the owning thread
/// and unlocking from a non-owning thread are undefined behavior at the
/// pthread level. The guard API makes the latter unrepresentable; the
/// former is the caller's responsibility.
pub struct Mutex<T> {
    // Boxed so the address pthread_mutex_init registered stays stable.
    handle: Box<UnsafeCell<libc::pthread_mutex_t>>,
    data: UnsafeCell<T>,
}

// Safety: Mutex provides exclusive access to T through the guard
unsafe impl<T: Send> Send for Mutex<T> {}
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Create a mutex wrapping `value`
    pub fn new(value: T) -> PoolResult<Self> {
        let handle: Box<UnsafeCell<libc::pthread_mutex_t>> =
            Box::new(UnsafeCell::new(unsafe { std::mem::zeroed() }));

        // pthread_* functions return the error code directly, not via errno
        let ret = unsafe { libc::pthread_mutex_init(handle.get(), std::ptr::null()) };
        if ret != 0 {
            return Err(PoolError::Platform(ret));
        }

        Ok(Self {
            handle,
            data: UnsafeCell::new(value),
        })
    }

    /// Block until exclusive ownership is acquired
    pub fn lock(&self) -> PoolResult<MutexGuard<'_, T>> {
        let ret = unsafe { libc::pthread_mutex_lock(self.handle.get()) };
        if ret != 0 {
            return Err(PoolError::Platform(ret));
        }
        Ok(MutexGuard {
            lock: self,
            _not_send: PhantomData,
        })
    }

    /// Construct a guard for an already-held lock (used by `Condvar` after
    /// pthread re-acquires the mutex on wakeup)
    ///
    /// # Safety
    ///
    /// The calling thread must currently own the mutex.
    pub(crate) unsafe fn guard_unchecked(&self) -> MutexGuard<'_, T> {
        MutexGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Raw pthread handle, for composing with a condition variable
    ///
    /// The handle stays owned by this mutex; callers must not destroy it.
    pub fn native_handle(&self) -> *mut libc::pthread_mutex_t {
        self.handle.get()
    }
}

impl<T> Drop for Mutex<T> {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_mutex_destroy(self.handle.get());
        }
    }
}

/// Guard that releases the mutex when dropped
///
/// Not `Send`: pthread requires the unlocking thread to be the owner.
pub struct MutexGuard<'a, T> {
    lock: &'a Mutex<T>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, T> MutexGuard<'a, T> {
    /// The mutex this guard holds (used by `Condvar::wait`)
    pub(crate) fn mutex(&self) -> &'a Mutex<T> {
        self.lock
    }
}

impl<'a, T> Deref for MutexGuard<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // Safety: we hold the lock
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for MutexGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // Safety: we hold the lock
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for MutexGuard<'a, T> {
    fn drop(&mut self) {
        // A failed unlock here would mean the guard invariant was already
        // broken; there is nothing useful to do with the code.
        unsafe {
            libc::pthread_mutex_unlock(self.lock.handle.get());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_mutex_basic() {
        let lock = Mutex::new(0u32).unwrap();
        {
            let mut guard = lock.lock().unwrap();
            *guard = 42;
        }
        {
            let guard = lock.lock().unwrap();
            assert_eq!(*guard, 42);
        }
    }

    #[test]
    fn test_mutex_concurrent() {
        let lock = Arc::new(Mutex::new(0u32).unwrap());
        let mut handles = vec![];

        for _ in 0..4 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    let mut guard = lock.lock().unwrap();
                    *guard += 1;
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let guard = lock.lock().unwrap();
        assert_eq!(*guard, 4000);
    }

    #[test]
    fn test_native_handle_stable() {
        let lock = Mutex::new(()).unwrap();
        let a = lock.native_handle();
        let b = lock.native_handle();
        assert!(!a.is_null());
        assert_eq!(a, b);
    }
}
