//! # reqpool - fixed-size worker pool for network servers
//!
//! The synchronization and scheduling engine of a half-sync/half-reactor
//! server: a bounded FIFO of pending requests fed by an external I/O
//! dispatcher and drained by a fixed set of worker threads.
//!
//! ## Features
//!
//! - **Two dispatch protocols**: reactor (workers run the read/process/write
//!   state machine) and proactor (I/O done before enqueue, workers run
//!   business logic only), selected once at construction
//! - **Native primitives**: POSIX semaphore, pthread mutex and condition
//!   variable, each owning its handle for its whole lifetime
//! - **Non-blocking producers**: a full queue refuses work instead of
//!   stalling the dispatcher
//! - **Scoped resources**: one pooled resource (e.g. a database connection)
//!   bound per `process` call, returned on every exit path
//! - **Graceful shutdown**: workers unpark, finish their current request
//!   and join
//!
//! ## Quick Start
//!
//! ```ignore
//! use reqpool::{PoolConfig, DispatchMode, Stage, WorkerPool};
//! use std::sync::Arc;
//!
//! // HttpConn: Request<DbConn>; DbPool: ResourcePool<Resource = DbConn>
//! let pool = WorkerPool::new(
//!     PoolConfig::new().workers(8).dispatch(DispatchMode::Reactor),
//!     Arc::new(DbPool::connect(url)?),
//! )?;
//!
//! // I/O dispatcher, on read readiness:
//! let conn: Arc<HttpConn> = accept_ready_connection();
//! if !pool.append(&conn, Stage::Read) {
//!     // queue full: shed the request, dispatcher owns the retry policy
//! }
//!
//! // later, observe conn.state().improv() / timer_flag()
//! ```
//!
//! ## Architecture
//!
//! ```text
//! I/O dispatcher ──append/append_p──► bounded FIFO ──wait/pop──► worker
//!                                                                  │
//!                ◄── improv / timer_flag on the request ◄── drive ─┘
//! ```

// Core types and traits
pub use reqpool_core::error::{PoolError, PoolResult};
pub use reqpool_core::log::{set_flush_enabled, set_log_level, LogLevel};
pub use reqpool_core::request::{Request, RequestState, Stage};
pub use reqpool_core::resource::ResourcePool;

// Runtime
pub use reqpool_runtime::config::{DispatchMode, PoolConfig, DEFAULT_MAX_REQUESTS, DEFAULT_WORKERS};
pub use reqpool_runtime::dispatch::{Dispatch, Proactor, Reactor};
pub use reqpool_runtime::pool::WorkerPool;
pub use reqpool_runtime::queue::RequestQueue;
pub use reqpool_runtime::resource::ScopedResource;
pub use reqpool_runtime::sync::{Condvar, Mutex, MutexGuard, Semaphore};

// Logging macros (exported at the reqpool-core crate root)
pub use reqpool_core::{kdebug, kerror, kinfo, ktrace, kwarn};
