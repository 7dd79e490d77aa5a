use std::sync::Arc;

use tokio::sync::watch;

/// Server-wide stop flag. Clones share one flag; tripping it stops the
/// logout worker and every task holding a [`ShutdownRx`].
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trip the flag. Stays set even when nobody is listening yet.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.tx.subscribe())
    }
}

/// Listening side of [`Shutdown`], one per background task.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

impl ShutdownRx {
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once the flag is tripped or every [`Shutdown`] is gone.
    pub async fn wait(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn trigger_reaches_existing_and_late_listeners() {
        let shutdown = Shutdown::new();
        let early = shutdown.subscribe();
        assert!(!early.is_shutdown());

        shutdown.clone().trigger();
        assert!(shutdown.is_triggered());
        assert!(early.is_shutdown());
        assert!(shutdown.subscribe().is_shutdown());
    }

    #[tokio::test]
    async fn wait_wakes_on_trigger() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            shutdown.trigger();
        });
        rx.wait().await;
        assert!(rx.is_shutdown());
    }

    #[tokio::test]
    async fn wait_returns_when_every_sender_dropped() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        drop(shutdown);
        rx.wait().await;
        assert!(!rx.is_shutdown());
    }
}
