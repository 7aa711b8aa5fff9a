//! Shared library for cross-cutting concerns in auth-platform Rust services.
//!
//! This crate provides centralized implementations for:
//! - A process-wide shutdown signal with OS signal handling
//! - Tracing subscriber initialization
//! - An in-process TTL cache

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod shutdown;
pub mod tracing_config;
pub mod ttl_cache;

pub use shutdown::{wait_for_signal, ShutdownSignal, ShutdownTrigger};
pub use tracing_config::{init_tracing, TracingConfig};
pub use ttl_cache::{TtlCache, TtlCacheConfig};
