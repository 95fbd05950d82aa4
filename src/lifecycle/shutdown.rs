//! Shutdown coordination.
//!
//! The flag is latched: a task that subscribes after `trigger` (the TLS
//! drain task, a late reload loop) still observes the shutdown.

use tokio::sync::watch;

/// Owner side of the shutdown flag.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal. Safe to call more than once.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener side handed to the server and background tasks.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered, or the owner is gone.
    pub async fn recv(&mut self) {
        loop {
            let triggered = *self.rx.borrow_and_update();
            if triggered {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn every_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), a.recv()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), b.recv()).await.unwrap();
    }

    #[tokio::test]
    async fn late_subscriber_still_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(shutdown.is_triggered());

        let mut late = shutdown.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.recv()).await.unwrap();
    }

    #[tokio::test]
    async fn untriggered_signal_stays_pending() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        let waited = tokio::time::timeout(Duration::from_millis(50), signal.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn dropped_owner_releases_listeners() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), signal.recv()).await.unwrap();
    }

    #[test]
    fn trigger_without_subscribers_is_harmless() {
        let shutdown = Shutdown::default();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }
}
