//! Basic reqpool example
//!
//! Plays the role of the I/O dispatcher: fabricates a handful of requests,
//! pushes them through the pool in both dispatch modes and prints the
//! flags the workers left behind.
//!
//! # Environment Variables
//!
//! - `RQP_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `RQP_FLUSH_EPRINT=1` - Flush debug output immediately

use reqpool::{
    kinfo, DispatchMode, PoolConfig, Request, RequestState, ResourcePool, Stage, WorkerPool,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Stand-in for a database connection
struct FakeConn {
    id: usize,
}

/// Stand-in for a database connection pool: hands out numbered connections
struct FakeConnPool {
    next_id: AtomicUsize,
    returned: AtomicUsize,
}

impl FakeConnPool {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicUsize::new(0),
            returned: AtomicUsize::new(0),
        })
    }
}

impl ResourcePool for FakeConnPool {
    type Resource = FakeConn;

    fn acquire(&self) -> FakeConn {
        FakeConn {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
        }
    }

    fn release(&self, _conn: FakeConn) {
        self.returned.fetch_add(1, Ordering::SeqCst);
    }
}

/// Stand-in for an HTTP connection: "reads" succeed unless scripted broken
struct FakeHttpConn {
    peer: &'static str,
    broken: bool,
    state: RequestState,
}

impl FakeHttpConn {
    fn new(peer: &'static str, broken: bool) -> Arc<Self> {
        Arc::new(Self {
            peer,
            broken,
            state: RequestState::new(),
        })
    }
}

impl Request<FakeConn> for FakeHttpConn {
    fn read_once(&self) -> bool {
        !self.broken
    }

    fn write(&self) -> bool {
        !self.broken
    }

    fn process(&self, conn: &mut FakeConn) {
        kinfo!("[{}] processed with connection {}", self.peer, conn.id);
    }

    fn state(&self) -> &RequestState {
        &self.state
    }
}

fn main() {
    println!("=== reqpool basic example ===\n");

    let conns = FakeConnPool::new();

    // Reactor mode: the pool drives the read/process/write state machine
    let pool = WorkerPool::new(
        PoolConfig::new().workers(4).max_requests(16),
        Arc::clone(&conns),
    )
    .expect("pool construction");

    let healthy = FakeHttpConn::new("10.0.0.1:4242", false);
    let broken = FakeHttpConn::new("10.0.0.2:4711", true);
    let writer = FakeHttpConn::new("10.0.0.3:1234", false);

    assert!(pool.append(&healthy, Stage::Read));
    assert!(pool.append(&broken, Stage::Read));
    assert!(pool.append(&writer, Stage::Write));

    std::thread::sleep(Duration::from_millis(200));
    pool.join();

    for req in [&healthy, &broken, &writer] {
        println!(
            "reactor  {}: improv={} timer_flag={}",
            req.peer,
            req.state().improv(),
            req.state().timer_flag()
        );
    }

    // Proactor mode: I/O is "already done", workers only run business logic
    let pool = WorkerPool::new(
        PoolConfig::new()
            .workers(2)
            .max_requests(16)
            .dispatch(DispatchMode::Proactor),
        Arc::clone(&conns),
    )
    .expect("pool construction");

    let done_io = FakeHttpConn::new("10.0.0.4:9000", false);
    assert!(pool.append_p(&done_io));

    std::thread::sleep(Duration::from_millis(200));
    pool.join();

    println!(
        "proactor {}: improv={} timer_flag={} (flags stay with the dispatcher)",
        done_io.peer,
        done_io.state().improv(),
        done_io.state().timer_flag()
    );

    println!(
        "\nconnections returned to the pool: {}",
        conns.returned.load(Ordering::SeqCst)
    );
}
