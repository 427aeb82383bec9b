//! # reqpool-core
//!
//! Platform-agnostic types and traits for the reqpool worker pool.
//!
//! This crate provides:
//! - The [`Request`](request::Request) capability contract between the
//!   I/O dispatcher and the pool
//! - The [`ResourcePool`](resource::ResourcePool) contract for scoped
//!   resource acquisition during processing
//! - The error taxonomy ([`error::PoolError`])
//! - Leveled stderr logging macros ([`kinfo!`], [`kdebug!`], ...)
//!
//! The synchronization primitives and the pool itself live in
//! `reqpool-runtime`.

pub mod error;
pub mod log;
pub mod request;
pub mod resource;

// Re-exports
pub use error::{PoolError, PoolResult};
pub use log::{set_flush_enabled, set_log_level, LogLevel};
pub use request::{Request, RequestState, Stage};
pub use resource::ResourcePool;
