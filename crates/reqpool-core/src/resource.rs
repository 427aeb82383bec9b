//! External resource pool contract
//!
//! The worker pool never owns pooled resources (database connections, file
//! handles, ...). It only borrows one per `process` call through the
//! scoped-acquisition guard in `reqpool-runtime`, which guarantees the
//! resource is handed back on every exit path.

/// A pool of reusable resources the worker pool can borrow from
///
/// `acquire` is infallible at this layer; pools whose checkout can fail
/// model that inside their `Resource` type (e.g. an `Option` or a
/// reconnecting handle). `acquire` may block until a resource is free.
pub trait ResourcePool: Send + Sync {
    type Resource: Send;

    /// Take a resource out of the pool, blocking until one is available
    fn acquire(&self) -> Self::Resource;

    /// Hand a resource back to the pool
    fn release(&self, resource: Self::Resource);
}
