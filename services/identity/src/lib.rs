//! Identity Service library.
//!
//! Registers users, verifies credentials, issues HS256 access/refresh
//! tokens and serves user lookups over HTTP and gRPC, with both listeners
//! run under one supervisor and a shared shutdown signal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod grpc;
pub mod http;
pub mod jwt;
pub mod metrics;
pub mod model;
pub mod password;
pub mod server;
pub mod storage;

// Re-exports for convenience
pub use auth::AuthService;
pub use config::Config;
pub use error::AuthError;
