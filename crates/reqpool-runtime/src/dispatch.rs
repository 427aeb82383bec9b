//! Dispatch strategies
//!
//! The two protocols a worker can drive a popped request through. The
//! strategy is selected once at pool construction and shared by all
//! workers; the hot loop sees a single `drive` call, not a mode branch.
//!
//! Neither strategy retries anything: a failed read or write is reported
//! solely through the request's `improv`/`timer_flag` convention, and the
//! dispatcher owns all retry/reconnect/expiry policy.

use crate::resource::ScopedResource;
use reqpool_core::request::{Request, Stage};
use reqpool_core::resource::ResourcePool;

/// One dispatch protocol: drive a request through one full round
pub trait Dispatch<P, R>: Send + Sync
where
    P: ResourcePool,
    R: Request<P::Resource>,
{
    fn drive(&self, request: &R, resources: &P);
}

/// Reactor protocol: the worker performs the read/process/write state
/// machine itself, steered by the request's stage tag
pub struct Reactor;

impl<P, R> Dispatch<P, R> for Reactor
where
    P: ResourcePool,
    R: Request<P::Resource>,
{
    fn drive(&self, request: &R, resources: &P) {
        match request.state().stage() {
            Stage::Read => {
                if request.read_once() {
                    request.state().set_improv(true);
                    let mut resource = ScopedResource::acquire(resources);
                    request.process(&mut resource);
                } else {
                    request.state().set_improv(true);
                    request.state().set_timer_flag(true);
                }
            }
            Stage::Write => {
                if request.write() {
                    request.state().set_improv(true);
                } else {
                    request.state().set_improv(true);
                    request.state().set_timer_flag(true);
                }
            }
        }
    }
}

/// Proactor protocol: I/O already completed before enqueue; run the
/// business logic unconditionally and leave the flags to the dispatcher
pub struct Proactor;

impl<P, R> Dispatch<P, R> for Proactor
where
    P: ResourcePool,
    R: Request<P::Resource>,
{
    fn drive(&self, request: &R, resources: &P) {
        let mut resource = ScopedResource::acquire(resources);
        request.process(&mut resource);
    }
}
