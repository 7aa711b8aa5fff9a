//! Registration, login and token refresh.

mod service;

pub use service::{AuthService, CreateUser, Session};
