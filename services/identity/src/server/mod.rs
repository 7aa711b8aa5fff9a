//! Listener lifecycle and process supervision.

pub mod listener;
pub mod supervisor;

pub use listener::{Listener, ListenerError, ListenerHandle, ListenerState, ListenerStatus, Protocol};
pub use supervisor::{Supervisor, SupervisorError};
