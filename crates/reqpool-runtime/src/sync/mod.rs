//! Native synchronization primitives
//!
//! Thin owners of POSIX handles, in three pieces:
//! - [`Semaphore`] - counting semaphore over `sem_t`; the pool's
//!   queue-not-empty notification
//! - [`Mutex`] - `pthread_mutex_t` plus a guarded payload; protects all
//!   queue mutations
//! - [`Condvar`] - `pthread_cond_t`; not used by the pool's own loop but
//!   provided for collaborators (connection pools, timer subsystems) that
//!   share the same native-handle lifecycle discipline
//!
//! Each owns its handle for its whole lifetime and destroys it on drop.
//! None of them can be cloned; the underlying handles are not duplicable.

mod cond;
mod mutex;
mod sem;

pub use cond::Condvar;
pub use mutex::{Mutex, MutexGuard};
pub use sem::Semaphore;
