//! Request contract between the I/O dispatcher and the worker pool
//!
//! The dispatcher is the sole owner of a request. The pool receives an
//! `Arc` clone for the duration of exactly one dispatch call and drops it
//! when that call returns; it never retains, frees, or re-queues a request.
//! Out-of-band results travel back through [`RequestState`]: `improv` means
//! "this round is done, resume monitoring the connection", `timer_flag`
//! means "expire this connection".

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Processing stage of a request (reactor mode only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    /// The connection still has to be read
    Read = 0,
    /// A response is pending and has to be written
    Write = 1,
}

impl Stage {
    /// Decode from the wire/config representation (0 = read, anything else = write)
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Stage::Read,
            _ => Stage::Write,
        }
    }

    pub fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Shared signal block embedded in every request
///
/// Atomics make the flags race-free to observe from the dispatcher thread
/// after the pool has relinquished its reference.
#[derive(Debug)]
pub struct RequestState {
    stage: AtomicU8,
    improv: AtomicBool,
    timer_flag: AtomicBool,
}

impl RequestState {
    pub fn new() -> Self {
        Self {
            stage: AtomicU8::new(Stage::Read.as_raw()),
            improv: AtomicBool::new(false),
            timer_flag: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        Stage::from_raw(self.stage.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set_stage(&self, stage: Stage) {
        self.stage.store(stage.as_raw(), Ordering::Release);
    }

    #[inline]
    pub fn improv(&self) -> bool {
        self.improv.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_improv(&self, v: bool) {
        self.improv.store(v, Ordering::Release);
    }

    #[inline]
    pub fn timer_flag(&self) -> bool {
        self.timer_flag.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_timer_flag(&self, v: bool) {
        self.timer_flag.store(v, Ordering::Release);
    }

    /// Clear both out-flags (dispatcher side, before re-enqueueing a connection)
    pub fn reset_flags(&self) {
        self.set_improv(false);
        self.set_timer_flag(false);
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability contract the pool drives a request through
///
/// `Res` is the pooled resource type (e.g. a database connection) bound for
/// the lexical duration of `process` in both dispatch modes.
///
/// Methods take `&self`: a request is driven by exactly one worker at a time,
/// and implementations keep their connection state behind whatever interior
/// mutability fits them.
pub trait Request<Res>: Send + Sync {
    /// Drain the socket once. `false` means the connection is broken and
    /// should be expired.
    fn read_once(&self) -> bool;

    /// Flush the pending response. `false` means the connection is broken.
    fn write(&self) -> bool;

    /// Run the business logic with a pooled resource bound
    fn process(&self, resource: &mut Res);

    /// The shared stage/flag block for this request
    fn state(&self) -> &RequestState;
}
