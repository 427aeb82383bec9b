//! Scoped acquisition of pooled resources
//!
//! A worker binds a resource immediately before the business-logic call and
//! hands it back when the guard leaves scope, on every exit path including
//! a panic unwinding out of `process`. Pooled resources can therefore never
//! leak across request failures.

use reqpool_core::resource::ResourcePool;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

/// RAII guard holding one resource checked out of a [`ResourcePool`]
///
/// Dereferences to the resource; drop returns it to the pool.
pub struct ScopedResource<'a, P: ResourcePool> {
    pool: &'a P,
    resource: ManuallyDrop<P::Resource>,
}

impl<'a, P: ResourcePool> ScopedResource<'a, P> {
    /// Check a resource out of `pool` for the lifetime of the guard
    pub fn acquire(pool: &'a P) -> Self {
        Self {
            pool,
            resource: ManuallyDrop::new(pool.acquire()),
        }
    }
}

impl<'a, P: ResourcePool> Deref for ScopedResource<'a, P> {
    type Target = P::Resource;

    #[inline]
    fn deref(&self) -> &P::Resource {
        &self.resource
    }
}

impl<'a, P: ResourcePool> DerefMut for ScopedResource<'a, P> {
    #[inline]
    fn deref_mut(&mut self) -> &mut P::Resource {
        &mut self.resource
    }
}

impl<'a, P: ResourcePool> Drop for ScopedResource<'a, P> {
    fn drop(&mut self) {
        // Safety: drop runs exactly once and the resource is never touched
        // afterwards
        let resource = unsafe { ManuallyDrop::take(&mut self.resource) };
        self.pool.release(resource);
    }
}
