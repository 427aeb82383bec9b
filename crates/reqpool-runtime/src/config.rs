//! Worker pool configuration
//!
//! Supplied once at construction; thread count and queue depth are fixed
//! for the pool's entire lifetime.

/// Default number of worker threads
pub const DEFAULT_WORKERS: usize = 8;

/// Default maximum number of queued, unprocessed requests
pub const DEFAULT_MAX_REQUESTS: usize = 10_000;

/// Which dispatch protocol the workers run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// The pool performs the read/process/write state machine itself
    Reactor,
    /// I/O is done before enqueue; the pool only runs business logic
    Proactor,
}

impl DispatchMode {
    /// Decode from the legacy integer switch (reactor = 1, anything else
    /// proactor)
    pub fn from_raw(raw: i32) -> Self {
        if raw == 1 {
            DispatchMode::Reactor
        } else {
            DispatchMode::Proactor
        }
    }
}

/// Configuration for a [`WorkerPool`](crate::pool::WorkerPool)
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,

    /// Maximum number of requests waiting in the queue; pushes beyond this
    /// are refused, not blocked
    pub max_requests: usize,

    /// Dispatch protocol, selected once here
    pub dispatch: DispatchMode,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_requests: DEFAULT_MAX_REQUESTS,
            dispatch: DispatchMode::Reactor,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Set the queue depth
    pub fn max_requests(mut self, n: usize) -> Self {
        self.max_requests = n;
        self
    }

    /// Set the dispatch protocol
    pub fn dispatch(mut self, mode: DispatchMode) -> Self {
        self.dispatch = mode;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.workers == 0 {
            return Err("workers must be at least 1");
        }
        if self.max_requests == 0 {
            return Err("max_requests must be at least 1");
        }
        Ok(())
    }
}
