//! A single network listener with an observable lifecycle.
//!
//! ```text
//! Idle -> Running -> ShuttingDown -> Stopped
//!   \______________________________/  (bind failure)
//! ```

use crate::metrics::LISTENER_TRANSITIONS;
use futures::future::BoxFuture;
use rust_common::ShutdownSignal;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Listener failures. Both are fatal to the process.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The address could not be bound
    #[error("Listener {name} failed to bind {addr}: {source}")]
    Bind {
        /// Listener name
        name: String,
        /// Requested address
        addr: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Serving failed after a successful bind
    #[error("Listener {name} failed while serving: {reason}")]
    Serve {
        /// Listener name
        name: String,
        /// Failure description
        reason: String,
    },
}

impl ListenerError {
    /// Name of the listener that failed.
    #[must_use]
    pub fn listener(&self) -> &str {
        match self {
            Self::Bind { name, .. } | Self::Serve { name, .. } => name,
        }
    }
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Created, not yet bound
    Idle,
    /// Bound and accepting
    Running,
    /// Signal received, draining in-flight work
    ShuttingDown,
    /// Terminal
    Stopped,
}

impl ListenerState {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        }
    }
}

/// Published listener status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStatus {
    /// Current state
    pub state: ListenerState,
    /// Bound address, once running
    pub local_addr: Option<SocketAddr>,
}

/// Serves one wire protocol on an already bound socket.
///
/// `serve` must stop accepting new connections as soon as `shutdown`
/// fires and resolve once in-flight work has drained. Failures are
/// reported as I/O errors; the owning [`Listener`] attaches its name.
pub trait Protocol: Send + 'static {
    /// Protocol label for logs.
    fn name(&self) -> &'static str;

    /// Serves until `shutdown` fires.
    fn serve(
        self: Box<Self>,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> BoxFuture<'static, io::Result<()>>;
}

/// Read-only view of a listener's status.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    name: String,
    rx: watch::Receiver<ListenerStatus>,
}

impl ListenerHandle {
    /// Listener name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ListenerState {
        self.rx.borrow().state
    }

    /// Bound address, if the listener got as far as binding.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.rx.borrow().local_addr
    }

    /// Waits until the listener reaches `state` (or has already passed
    /// through to `Stopped`). Returns the status observed.
    pub async fn wait_for(&mut self, state: ListenerState) -> ListenerStatus {
        let observed = self
            .rx
            .wait_for(|s| s.state == state || s.state == ListenerState::Stopped)
            .await
            .map(|status| *status);

        // A closed channel still holds the final status.
        observed.unwrap_or_else(|_| *self.rx.borrow())
    }

    /// Waits until the listener is accepting and returns its address, or
    /// `None` if it stopped without ever running.
    pub async fn running(&mut self) -> Option<SocketAddr> {
        let status = self.wait_for(ListenerState::Running).await;
        status.local_addr.filter(|_| status.state == ListenerState::Running)
    }
}

/// A named address, a protocol and a grace period.
pub struct Listener {
    name: String,
    addr: String,
    protocol: Box<dyn Protocol>,
    grace: Duration,
    status: watch::Sender<ListenerStatus>,
}

impl Listener {
    /// Creates an idle listener.
    pub fn new(
        name: impl Into<String>,
        addr: impl Into<String>,
        protocol: impl Protocol,
        grace: Duration,
    ) -> Self {
        let (status, _) = watch::channel(ListenerStatus {
            state: ListenerState::Idle,
            local_addr: None,
        });

        Self {
            name: name.into(),
            addr: addr.into(),
            protocol: Box::new(protocol),
            grace,
            status,
        }
    }

    /// Listener name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn handle(&self) -> ListenerHandle {
        ListenerHandle {
            name: self.name.clone(),
            rx: self.status.subscribe(),
        }
    }

    /// Binds, serves until `shutdown` fires, then drains for at most the
    /// grace period. Work still running after that is abandoned.
    ///
    /// # Errors
    ///
    /// `Bind` if the address cannot be bound, `Serve` if the protocol fails.
    pub async fn start(self, shutdown: ShutdownSignal) -> Result<(), ListenerError> {
        let Self {
            name,
            addr,
            protocol,
            grace,
            status,
        } = self;
        let publish = |state: ListenerState, local_addr: Option<SocketAddr>| {
            LISTENER_TRANSITIONS
                .with_label_values(&[name.as_str(), state.as_str()])
                .inc();
            status.send_replace(ListenerStatus { state, local_addr });
        };

        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => {
                error!(listener = %name, %addr, error = %source, "Bind failed");
                publish(ListenerState::Stopped, None);
                return Err(ListenerError::Bind { name, addr, source });
            }
        };

        let local_addr = listener.local_addr().ok();
        publish(ListenerState::Running, local_addr);
        info!(
            listener = %name,
            protocol = protocol.name(),
            addr = ?local_addr,
            "Listener running"
        );

        let mut serve = protocol.serve(listener, shutdown.clone());

        let result = tokio::select! {
            biased;
            () = shutdown.clone().recv() => {
                publish(ListenerState::ShuttingDown, local_addr);
                info!(listener = %name, grace = ?grace, "Listener draining");

                if let Ok(result) = tokio::time::timeout(grace, &mut serve).await {
                    result
                } else {
                    warn!(listener = %name, "Grace period elapsed, abandoning in-flight work");
                    Ok(())
                }
            }
            result = &mut serve => {
                if shutdown.is_shutdown() {
                    publish(ListenerState::ShuttingDown, local_addr);
                }
                result
            }
        };
        drop(serve);

        let result = result.map_err(|e| ListenerError::Serve {
            name: name.clone(),
            reason: e.to_string(),
        });

        publish(ListenerState::Stopped, local_addr);
        match &result {
            Ok(()) => info!(listener = %name, "Listener stopped"),
            Err(e) => error!(listener = %name, error = %e, "Listener stopped with error"),
        }
        result
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("addr", &self.addr)
            .field("protocol", &self.protocol.name())
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_common::ShutdownTrigger;

    /// Accepts nothing; resolves when the signal fires.
    struct Idle;

    impl Protocol for Idle {
        fn name(&self) -> &'static str {
            "idle"
        }

        fn serve(
            self: Box<Self>,
            listener: TcpListener,
            shutdown: ShutdownSignal,
        ) -> BoxFuture<'static, io::Result<()>> {
            Box::pin(async move {
                shutdown.recv().await;
                drop(listener);
                Ok(())
            })
        }
    }

    /// Ignores the signal entirely.
    struct Stubborn;

    impl Protocol for Stubborn {
        fn name(&self) -> &'static str {
            "stubborn"
        }

        fn serve(
            self: Box<Self>,
            _listener: TcpListener,
            _shutdown: ShutdownSignal,
        ) -> BoxFuture<'static, io::Result<()>> {
            Box::pin(futures::future::pending())
        }
    }

    /// Fails right after binding.
    struct Broken;

    impl Protocol for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn serve(
            self: Box<Self>,
            _listener: TcpListener,
            _shutdown: ShutdownSignal,
        ) -> BoxFuture<'static, io::Result<()>> {
            Box::pin(async { Err(io::Error::other("accept loop died")) })
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let trigger = ShutdownTrigger::new();
        let listener = Listener::new("a", "127.0.0.1:0", Idle, Duration::from_secs(1));
        let mut handle = listener.handle();
        assert_eq!(handle.state(), ListenerState::Idle);

        let task = tokio::spawn(listener.start(trigger.subscribe()));
        let addr = handle.running().await;
        assert!(addr.is_some());

        trigger.trigger("test");
        task.await.unwrap().unwrap();
        assert_eq!(handle.state(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_bind_failure_stops() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let trigger = ShutdownTrigger::new();
        let listener = Listener::new("a", addr, Idle, Duration::from_secs(1));
        let mut handle = listener.handle();

        let err = listener.start(trigger.subscribe()).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
        assert_eq!(err.listener(), "a");
        assert_eq!(handle.running().await, None);
        assert_eq!(handle.state(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_grace_period_abandons_work() {
        let trigger = ShutdownTrigger::new();
        let listener = Listener::new("slow", "127.0.0.1:0", Stubborn, Duration::from_millis(50));
        let mut handle = listener.handle();

        let task = tokio::spawn(listener.start(trigger.subscribe()));
        handle.running().await;
        trigger.trigger("test");

        let outcome = tokio::time::timeout(Duration::from_secs(2), task).await;
        assert!(outcome.unwrap().unwrap().is_ok());
        assert_eq!(handle.state(), ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_serve_error_carries_listener_name() {
        let trigger = ShutdownTrigger::new();
        let listener = Listener::new("edge", "127.0.0.1:0", Broken, Duration::from_secs(1));
        let mut handle = listener.handle();

        let err = listener.start(trigger.subscribe()).await.unwrap_err();
        match &err {
            ListenerError::Serve { name, reason } => {
                assert_eq!(name, "edge");
                assert!(reason.contains("accept loop died"));
            }
            other => panic!("expected serve error, got {other:?}"),
        }
        assert_eq!(
            handle.wait_for(ListenerState::Running).await.state,
            ListenerState::Stopped
        );
    }

    #[tokio::test]
    async fn test_wait_for_after_listener_finished() {
        let trigger = ShutdownTrigger::new();
        trigger.trigger("early");
        let listener = Listener::new("done", "127.0.0.1:0", Idle, Duration::from_secs(1));
        let mut handle = listener.handle();

        listener.start(trigger.subscribe()).await.unwrap();

        let status = handle.wait_for(ListenerState::ShuttingDown).await;
        assert_eq!(status.state, ListenerState::Stopped);
        assert!(status.local_addr.is_some());
    }
}
