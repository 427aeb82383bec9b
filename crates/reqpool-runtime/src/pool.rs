//! Fixed-size worker pool
//!
//! Decouples request arrival (an external I/O dispatcher) from request
//! processing. The pool owns N worker threads, the bounded request queue,
//! the mutex protecting it and the semaphore counting pending items -
//! nothing else. Sockets, parsing, timers and connection-pool internals are
//! collaborators it only touches through the [`Request`] and
//! [`ResourcePool`] contracts.
//!
//! Producers never block: `append`/`append_p` refuse work when the queue is
//! full and the caller owns the retry/drop policy. Workers block in exactly
//! one place, the semaphore wait. A request, once popped, runs to
//! completion on its worker; there is no preemption and no per-request
//! deadline at this layer.
//!
//! Graceful shutdown (`shutdown` + `join`, also run on drop) is an
//! intentional extension over the classic detached-thread pattern this
//! design descends from; requests still queued at shutdown stay untouched
//! and remain owned by the dispatcher.

use crate::config::{DispatchMode, PoolConfig};
use crate::dispatch::{Dispatch, Proactor, Reactor};
use crate::queue::RequestQueue;
use crate::sync::Semaphore;
use reqpool_core::error::{PoolError, PoolResult};
use reqpool_core::request::{Request, Stage};
use reqpool_core::resource::ResourcePool;
use reqpool_core::{kdebug, kerror, kinfo, kwarn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// State shared between the pool handle and its workers
struct Shared<P, R>
where
    P: ResourcePool,
    R: Request<P::Resource>,
{
    /// Pending requests, FIFO, capacity `max_requests`
    queue: RequestQueue<R>,

    /// Counts items pending pickup; one post per accepted append
    pending: Semaphore,

    /// External resource pool, borrowed from during `process` only
    resources: Arc<P>,

    /// Dispatch protocol, selected once at construction
    dispatch: Box<dyn Dispatch<P, R>>,

    /// Shutdown flag, checked by workers after every wakeup
    shutdown: AtomicBool,
}

impl<P, R> Shared<P, R>
where
    P: ResourcePool,
    R: Request<P::Resource>,
{
    fn worker_loop(&self, worker_id: usize) {
        kdebug!("worker {} started", worker_id);

        loop {
            if let Err(e) = self.pending.wait() {
                // Signal delivery (EINTR) lands here; treat it like a
                // spurious wake and re-wait.
                if self.shutdown.load(Ordering::Acquire) {
                    break;
                }
                kdebug!("worker {}: wait interrupted: {}", worker_id, e);
                continue;
            }

            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            let request = match self.queue.pop() {
                Ok(Some(request)) => request,
                // Another worker drained the queue between our wakeup and
                // the lock; absorbed, not an error.
                Ok(None) => continue,
                Err(e) => {
                    kerror!("worker {}: queue lock failed: {}", worker_id, e);
                    continue;
                }
            };

            // A panic out of request code must not take the worker down;
            // the scoped resource guard still releases during the unwind.
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                self.dispatch.drive(request.as_ref(), self.resources.as_ref());
            }));
            if outcome.is_err() {
                kerror!("worker {}: request processing panicked", worker_id);
            }

            // The pool's borrow of the request ends here; the dispatcher
            // remains the sole owner.
            drop(request);
        }

        kdebug!("worker {} stopped", worker_id);
    }
}

/// Fixed-size pool of worker threads consuming dispatcher requests
///
/// `P` is the external resource pool bound during processing, `R` the
/// concrete request type. Thread count, queue depth and dispatch mode are
/// fixed at construction.
pub struct WorkerPool<P, R>
where
    P: ResourcePool + 'static,
    R: Request<P::Resource> + 'static,
{
    shared: Arc<Shared<P, R>>,
    handles: Vec<JoinHandle<()>>,
    workers: usize,
}

impl<P, R> WorkerPool<P, R>
where
    P: ResourcePool + 'static,
    R: Request<P::Resource> + 'static,
{
    /// Validate the configuration and spawn the worker threads
    ///
    /// Fails with [`PoolError::InvalidConfig`] on a zero thread count or
    /// queue depth, and with [`PoolError::SpawnFailed`] if the OS refuses a
    /// thread; in the latter case already-started workers are shut down and
    /// joined before returning, so a failed construction leaves nothing
    /// behind.
    pub fn new(config: PoolConfig, resources: Arc<P>) -> PoolResult<Self> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let dispatch: Box<dyn Dispatch<P, R>> = match config.dispatch {
            DispatchMode::Reactor => Box::new(Reactor),
            DispatchMode::Proactor => Box::new(Proactor),
        };

        let shared = Arc::new(Shared {
            queue: RequestQueue::new(config.max_requests)?,
            pending: Semaphore::new(0)?,
            resources,
            dispatch,
            shutdown: AtomicBool::new(false),
        });

        let mut handles = Vec::with_capacity(config.workers);
        for i in 0..config.workers {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("reqpool-worker-{}", i))
                .spawn(move || worker_shared.worker_loop(i));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    kwarn!("failed to spawn worker {}: {}", i, e);
                    shared.shutdown.store(true, Ordering::Release);
                    for _ in 0..handles.len() {
                        let _ = shared.pending.post();
                    }
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(PoolError::SpawnFailed);
                }
            }
        }

        kinfo!(
            "worker pool started: {} workers, queue depth {}, {:?} dispatch",
            config.workers,
            config.max_requests,
            config.dispatch
        );

        Ok(Self {
            shared,
            handles,
            workers: config.workers,
        })
    }

    /// Enqueue a request and tag its stage (reactor mode)
    ///
    /// Non-blocking; `false` means the queue is full (or the pool is
    /// shutting down) and the caller must retry or drop. On success the
    /// semaphore is posted exactly once, so exactly one current or future
    /// worker wait is released per accepted request.
    pub fn append(&self, request: &Arc<R>, stage: Stage) -> bool {
        self.enqueue(request, Some(stage))
    }

    /// Enqueue a request without touching its stage (proactor mode)
    pub fn append_p(&self, request: &Arc<R>) -> bool {
        self.enqueue(request, None)
    }

    fn enqueue(&self, request: &Arc<R>, stage: Option<Stage>) -> bool {
        if self.shared.shutdown.load(Ordering::Acquire) {
            return false;
        }

        let pushed = match stage {
            Some(stage) => self
                .shared
                .queue
                .push_with(Arc::clone(request), |r| r.state().set_stage(stage)),
            None => self.shared.queue.push(Arc::clone(request)),
        };

        match pushed {
            Ok(true) => {
                if let Err(e) = self.shared.pending.post() {
                    // sem_post only fails on counter overflow; the item is
                    // queued and will be picked up with the next wakeup.
                    kerror!("semaphore post failed: {}", e);
                }
                true
            }
            Ok(false) => false,
            Err(e) => {
                kerror!("append failed: {}", e);
                false
            }
        }
    }

    /// Number of requests currently queued (not yet picked up)
    pub fn queued(&self) -> PoolResult<usize> {
        self.shared.queue.len()
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Signal all workers to stop after their current request
    ///
    /// Idempotent. Posts the semaphore once per worker so parked workers
    /// unblock; requests still queued are not processed.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        kinfo!("worker pool shutting down");
        for _ in 0..self.workers {
            let _ = self.shared.pending.post();
        }
    }

    /// Shut down and wait for all workers to finish
    pub fn join(mut self) {
        self.shutdown();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl<P, R> Drop for WorkerPool<P, R>
where
    P: ResourcePool + 'static,
    R: Request<P::Resource> + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqpool_core::request::RequestState;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    /// Resource pool handing out unit tokens, counting checkouts/returns
    struct TokenPool {
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    impl TokenPool {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            })
        }

        fn balanced(&self, n: usize) -> bool {
            self.acquired.load(Ordering::SeqCst) == n && self.released.load(Ordering::SeqCst) == n
        }
    }

    impl ResourcePool for TokenPool {
        type Resource = ();

        fn acquire(&self) {
            self.acquired.fetch_add(1, Ordering::SeqCst);
        }

        fn release(&self, _resource: ()) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Gate that parks `process` calls until opened
    struct Gate {
        open: AtomicBool,
        arrived: AtomicUsize,
    }

    impl Gate {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                open: AtomicBool::new(false),
                arrived: AtomicUsize::new(0),
            })
        }

        fn block(&self) {
            self.arrived.fetch_add(1, Ordering::SeqCst);
            while !self.open.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
        }

        fn open(&self) {
            self.open.store(true, Ordering::SeqCst);
        }
    }

    struct TestRequest {
        state: RequestState,
        read_ok: bool,
        panic_in_process: bool,
        gate: Option<Arc<Gate>>,
        reads: AtomicUsize,
        processed: AtomicUsize,
    }

    impl TestRequest {
        fn new(read_ok: bool) -> Arc<Self> {
            Arc::new(Self {
                state: RequestState::new(),
                read_ok,
                panic_in_process: false,
                gate: None,
                reads: AtomicUsize::new(0),
                processed: AtomicUsize::new(0),
            })
        }

        fn gated(gate: &Arc<Gate>) -> Arc<Self> {
            Arc::new(Self {
                state: RequestState::new(),
                read_ok: true,
                panic_in_process: false,
                gate: Some(Arc::clone(gate)),
                reads: AtomicUsize::new(0),
                processed: AtomicUsize::new(0),
            })
        }

        fn panicking() -> Arc<Self> {
            Arc::new(Self {
                state: RequestState::new(),
                read_ok: true,
                panic_in_process: true,
                gate: None,
                reads: AtomicUsize::new(0),
                processed: AtomicUsize::new(0),
            })
        }

        fn processed(&self) -> usize {
            self.processed.load(Ordering::SeqCst)
        }
    }

    impl Request<()> for TestRequest {
        fn read_once(&self) -> bool {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.read_ok
        }

        fn write(&self) -> bool {
            true
        }

        fn process(&self, _resource: &mut ()) {
            if let Some(gate) = &self.gate {
                gate.block();
            }
            if self.panic_in_process {
                panic!("scripted failure");
            }
            self.processed.fetch_add(1, Ordering::SeqCst);
        }

        fn state(&self) -> &RequestState {
            &self.state
        }
    }

    fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn test_zero_workers_fails_fast() {
        let result: PoolResult<WorkerPool<TokenPool, TestRequest>> =
            WorkerPool::new(PoolConfig::new().workers(0), TokenPool::new());
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_queue_depth_fails_fast() {
        let result: PoolResult<WorkerPool<TokenPool, TestRequest>> =
            WorkerPool::new(PoolConfig::new().max_requests(0), TokenPool::new());
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_exactly_once_delivery() {
        let resources = TokenPool::new();
        let pool = WorkerPool::new(
            PoolConfig::new().workers(4).max_requests(100),
            Arc::clone(&resources),
        )
        .unwrap();

        let requests: Vec<_> = (0..50).map(|_| TestRequest::new(true)).collect();
        for req in &requests {
            assert!(pool.append(req, Stage::Read));
        }

        assert!(wait_until(Duration::from_secs(5), || {
            requests.iter().all(|r| r.processed() == 1)
        }));

        // No duplication: exactly one worker drove each request
        for req in &requests {
            assert_eq!(req.processed(), 1);
            assert_eq!(req.reads.load(Ordering::SeqCst), 1);
            assert!(req.state.improv());
            assert!(!req.state.timer_flag());
        }
        assert!(resources.balanced(50));

        pool.join();
    }

    #[test]
    fn test_read_failure_sets_flags_and_skips_process() {
        let pool = WorkerPool::new(
            PoolConfig::new().workers(2).max_requests(10),
            TokenPool::new(),
        )
        .unwrap();

        let req = TestRequest::new(false);
        assert!(pool.append(&req, Stage::Read));

        assert!(wait_until(Duration::from_secs(5), || req.state.improv()));
        assert!(req.state.timer_flag());
        assert_eq!(req.processed(), 0);

        pool.join();
    }

    #[test]
    fn test_proactor_processes_unconditionally() {
        let resources = TokenPool::new();
        let pool = WorkerPool::new(
            PoolConfig::new()
                .workers(2)
                .max_requests(10)
                .dispatch(DispatchMode::Proactor),
            Arc::clone(&resources),
        )
        .unwrap();

        // read_ok = false is irrelevant: proactor never reads or writes
        let requests: Vec<_> = (0..8).map(|_| TestRequest::new(false)).collect();
        for req in &requests {
            assert!(pool.append_p(req));
        }

        assert!(wait_until(Duration::from_secs(5), || {
            requests.iter().all(|r| r.processed() == 1)
        }));

        for req in &requests {
            assert_eq!(req.reads.load(Ordering::SeqCst), 0);
            assert!(!req.state.improv());
            assert!(!req.state.timer_flag());
        }
        assert!(resources.balanced(8));

        pool.join();
    }

    #[test]
    fn test_full_queue_rejects_while_workers_busy() {
        let resources = TokenPool::new();
        let pool = WorkerPool::new(
            PoolConfig::new().workers(4).max_requests(2),
            Arc::clone(&resources),
        )
        .unwrap();

        // Occupy all four workers with gated requests. The queue only holds
        // two, so re-append until each is accepted as workers pick them up.
        let gate = Gate::new();
        let blockers: Vec<_> = (0..4).map(|_| TestRequest::gated(&gate)).collect();
        for blocker in &blockers {
            assert!(wait_until(Duration::from_secs(5), || {
                pool.append(blocker, Stage::Read)
            }));
        }
        assert!(wait_until(Duration::from_secs(5), || {
            gate.arrived.load(Ordering::SeqCst) == 4
        }));

        // All workers parked in process: three appends against depth 2 now
        // deterministically accept two and refuse the third.
        let extra: Vec<_> = (0..3).map(|_| TestRequest::new(true)).collect();
        let results: Vec<bool> = extra.iter().map(|r| pool.append(r, Stage::Read)).collect();
        assert_eq!(results, vec![true, true, false]);
        assert_eq!(pool.queued().unwrap(), 2);

        gate.open();

        assert!(wait_until(Duration::from_secs(5), || {
            blockers.iter().all(|r| r.processed() == 1)
                && extra[0].processed() == 1
                && extra[1].processed() == 1
        }));
        assert_eq!(extra[2].processed(), 0);

        // One resource checked out and returned per processed request
        assert!(resources.balanced(6));

        pool.join();
    }

    #[test]
    fn test_semaphore_matches_queue_length() {
        // The append/post and pop/wait linkage, exercised on the raw parts
        // the way the pool composes them.
        let queue: RequestQueue<TestRequest> = RequestQueue::new(10).unwrap();
        let pending = Semaphore::new(0).unwrap();

        for _ in 0..4 {
            assert!(queue.push(TestRequest::new(true)).unwrap());
            pending.post().unwrap();
            assert_eq!(pending.value().unwrap() as usize, queue.len().unwrap());
        }

        while queue.len().unwrap() > 0 {
            pending.wait().unwrap();
            queue.pop().unwrap().unwrap();
            assert_eq!(pending.value().unwrap() as usize, queue.len().unwrap());
        }
    }

    #[test]
    fn test_panic_in_process_does_not_kill_workers() {
        let resources = TokenPool::new();
        let pool = WorkerPool::new(
            PoolConfig::new().workers(1).max_requests(10),
            Arc::clone(&resources),
        )
        .unwrap();

        let bad = TestRequest::panicking();
        assert!(pool.append(&bad, Stage::Read));

        // The sole worker survives the panic and keeps serving
        let good = TestRequest::new(true);
        assert!(pool.append(&good, Stage::Read));
        assert!(wait_until(Duration::from_secs(5), || good.processed() == 1));

        // Both process calls bound a resource; both were returned, the
        // panicked one through the guard's unwind path
        assert!(resources.balanced(2));

        pool.join();
    }

    #[test]
    fn test_shutdown_leaves_queued_requests_untouched() {
        let gate = Gate::new();
        let pool = WorkerPool::new(
            PoolConfig::new().workers(1).max_requests(10),
            TokenPool::new(),
        )
        .unwrap();

        let blocker = TestRequest::gated(&gate);
        assert!(pool.append(&blocker, Stage::Read));
        assert!(wait_until(Duration::from_secs(5), || {
            gate.arrived.load(Ordering::SeqCst) == 1
        }));

        let queued = TestRequest::new(true);
        assert!(pool.append(&queued, Stage::Read));

        pool.shutdown();
        // Appends are refused once shutdown is signaled
        assert!(!pool.append(&TestRequest::new(true), Stage::Read));

        gate.open();
        pool.join();

        assert_eq!(blocker.processed(), 1);
        assert_eq!(queued.processed(), 0);
    }

    #[test]
    fn test_drop_joins_workers() {
        let pool = WorkerPool::new(
            PoolConfig::new().workers(2).max_requests(4),
            TokenPool::new(),
        )
        .unwrap();
        let req = TestRequest::new(true);
        assert!(pool.append(&req, Stage::Read));
        assert!(wait_until(Duration::from_secs(5), || req.processed() == 1));
        drop(pool); // must not hang
    }
}
