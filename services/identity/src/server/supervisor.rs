//! Runs every listener to completion or coordinated shutdown.

use super::listener::{Listener, ListenerError, ListenerHandle};
use futures::FutureExt;
use rust_common::{wait_for_signal, ShutdownTrigger};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Process outcome when a listener fails.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// A listener returned an error
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// A listener task panicked or was cancelled
    #[error("Listener {0} terminated abnormally")]
    Aborted(String),
}

/// Owns the shutdown signal shared by every listener.
#[derive(Debug, Default)]
pub struct Supervisor {
    listeners: Vec<Listener>,
    trigger: ShutdownTrigger,
}

impl Supervisor {
    /// Creates a supervisor with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns a view of its status.
    pub fn add(&mut self, listener: Listener) -> ListenerHandle {
        let handle = listener.handle();
        self.listeners.push(listener);
        handle
    }

    /// Trigger for the shared shutdown signal.
    #[must_use]
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }

    /// Runs until SIGINT/SIGTERM or the first listener failure.
    ///
    /// # Errors
    ///
    /// Returns the first listener failure.
    pub async fn run(self) -> Result<(), SupervisorError> {
        self.run_until(wait_for_signal()).await
    }

    /// Runs until `termination` resolves or the first listener failure,
    /// then waits for every listener to stop.
    ///
    /// # Errors
    ///
    /// Returns the first listener failure. Later failures are only logged.
    pub async fn run_until<F>(self, termination: F) -> Result<(), SupervisorError>
    where
        F: Future<Output = ()>,
    {
        let Self { listeners, trigger } = self;

        let mut tasks = JoinSet::new();
        for listener in listeners {
            let name = listener.name().to_string();
            let signal = trigger.subscribe();
            tasks.spawn(async move {
                let outcome = AssertUnwindSafe(listener.start(signal)).catch_unwind().await;
                (name, outcome)
            });
        }
        info!(listeners = tasks.len(), "Supervisor started");

        tokio::pin!(termination);
        let mut terminated = false;
        let mut first_error: Option<SupervisorError> = None;

        while !tasks.is_empty() {
            tokio::select! {
                () = &mut termination, if !terminated => {
                    terminated = true;
                    trigger.trigger("termination signal");
                }
                Some(joined) = tasks.join_next() => {
                    let failure = match joined {
                        Ok((_, Ok(Ok(())))) => None,
                        Ok((_, Ok(Err(e)))) => Some(SupervisorError::Listener(e)),
                        Ok((name, Err(_))) => Some(SupervisorError::Aborted(name)),
                        Err(e) => Some(SupervisorError::Aborted(e.to_string())),
                    };

                    if let Some(err) = failure {
                        error!(error = %err, "Listener failed, shutting down");
                        trigger.trigger("listener failure");
                        first_error.get_or_insert(err);
                    } else {
                        trigger.trigger("listener exited");
                    }
                }
                else => break,
            }
        }

        info!(clean = first_error.is_none(), "Supervisor stopped");
        first_error.map_or(Ok(()), Err)
    }
}
