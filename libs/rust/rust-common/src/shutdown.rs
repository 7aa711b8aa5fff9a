//! Process-wide shutdown signal.
//!
//! A [`ShutdownTrigger`] owns a one-shot flag that flips from idle to
//! triggered exactly once and is never reset. Any number of
//! [`ShutdownSignal`] handles observe it; a handle created after the flag
//! fired resolves immediately.

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// Owning side of the shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Creates an idle trigger.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Gets a signal handle observing this trigger.
    #[must_use]
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Fires the signal.
    ///
    /// Returns `true` only for the call that performed the transition;
    /// every later call is a no-op returning `false`.
    pub fn trigger(&self, reason: &str) -> bool {
        let was_triggered = self.tx.send_replace(true);
        if was_triggered {
            return false;
        }
        info!(reason, "Shutdown signal fired");
        true
    }

    /// Checks whether the signal has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ShutdownTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the shutdown flag.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits until the signal fires.
    ///
    /// Also resolves if the trigger is dropped, so a listener is never
    /// left waiting on an owner that no longer exists.
    pub async fn recv(mut self) {
        let _ = self.rx.wait_for(|fired| *fired).await;
    }

    /// Checks if shutdown has been signaled (non-blocking).
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Waits for SIGTERM or SIGINT.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_fires_once() {
        let trigger = ShutdownTrigger::new();
        assert!(!trigger.is_triggered());
        assert!(trigger.trigger("first"));
        assert!(!trigger.trigger("second"));
        assert!(trigger.is_triggered());
    }

    #[tokio::test]
    async fn test_all_subscribers_observe_signal() {
        let trigger = ShutdownTrigger::new();
        let signals: Vec<_> = (0..4).map(|_| trigger.subscribe()).collect();

        trigger.trigger("test");

        for signal in signals {
            tokio::time::timeout(Duration::from_secs(1), signal.recv())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_resolves_immediately() {
        let trigger = ShutdownTrigger::new();
        trigger.trigger("early");

        let late = trigger.subscribe();
        assert!(late.is_shutdown());
        tokio::time::timeout(Duration::from_millis(100), late.recv())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_pending_until_triggered() {
        let trigger = ShutdownTrigger::new();
        let signal = trigger.subscribe();
        assert!(!signal.is_shutdown());

        let waited = tokio::time::timeout(Duration::from_millis(50), signal.clone().recv()).await;
        assert!(waited.is_err());
    }
}
