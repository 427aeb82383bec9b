//! # reqpool-runtime
//!
//! Platform runtime for the reqpool worker pool.
//!
//! This crate provides:
//! - Native synchronization primitives over POSIX handles
//!   ([`sync::Semaphore`], [`sync::Mutex`], [`sync::Condvar`])
//! - The bounded FIFO request queue ([`queue::RequestQueue`])
//! - The two dispatch strategies ([`dispatch::Reactor`], [`dispatch::Proactor`])
//! - The fixed-size worker pool itself ([`pool::WorkerPool`])
//! - Scoped resource acquisition ([`resource::ScopedResource`])
//!
//! The pool performs no I/O and never owns a request: it borrows requests
//! pushed by an external I/O dispatcher, drives each through exactly one
//! dispatch call, and reports outcomes through the request's flag block.

// Platform check: the primitives sit directly on pthread/POSIX semaphores.
cfg_if::cfg_if! {
    if #[cfg(unix)] {
        // supported
    } else {
        compile_error!("reqpool-runtime requires a POSIX platform (pthread + POSIX semaphores)");
    }
}

pub mod config;
pub mod dispatch;
pub mod pool;
pub mod queue;
pub mod resource;
pub mod sync;

// Re-exports
pub use config::{DispatchMode, PoolConfig};
pub use dispatch::{Dispatch, Proactor, Reactor};
pub use pool::WorkerPool;
pub use resource::ScopedResource;
pub use sync::{Condvar, Mutex, MutexGuard, Semaphore};
