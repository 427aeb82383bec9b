//! Bounded FIFO of pending requests
//!
//! The only pool-owned concurrent data structure. All mutation happens
//! under one pthread mutex, so no two consumers can observe the same item
//! and relative push order is preserved across pops. A push against a full
//! queue is refused, never blocked: the pool sheds load instead of
//! stalling the dispatcher.

use crate::sync::Mutex;
use reqpool_core::error::PoolResult;
use std::collections::VecDeque;
use std::sync::Arc;

/// Fixed-capacity FIFO of shared request handles
pub struct RequestQueue<R> {
    items: Mutex<VecDeque<Arc<R>>>,
    capacity: usize,
}

impl<R> RequestQueue<R> {
    pub fn new(capacity: usize) -> PoolResult<Self> {
        Ok(Self {
            items: Mutex::new(VecDeque::with_capacity(capacity))?,
            capacity,
        })
    }

    /// Push to the back; `Ok(false)` when the queue is at capacity
    pub fn push(&self, request: Arc<R>) -> PoolResult<bool> {
        self.push_with(request, |_| {})
    }

    /// Push to the back, running `on_accept` under the queue lock just
    /// before the item is enqueued
    ///
    /// The pool uses the hook to tag the request's stage: it runs only for
    /// accepted requests, so a rejected push leaves both the queue and the
    /// request untouched.
    pub fn push_with(&self, request: Arc<R>, on_accept: impl FnOnce(&R)) -> PoolResult<bool> {
        let mut items = self.items.lock()?;
        if items.len() >= self.capacity {
            return Ok(false);
        }
        on_accept(&request);
        items.push_back(request);
        Ok(true)
    }

    /// Pop the front item; `None` on empty
    ///
    /// An empty pop after a semaphore wakeup is the benign
    /// multiple-consumer race, absorbed by the caller, never an error.
    pub fn pop(&self) -> PoolResult<Option<Arc<R>>> {
        let mut items = self.items.lock()?;
        Ok(items.pop_front())
    }

    /// Current length, observed under the queue mutex
    pub fn len(&self) -> PoolResult<usize> {
        let items = self.items.lock()?;
        Ok(items.len())
    }

    pub fn is_empty(&self) -> PoolResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
