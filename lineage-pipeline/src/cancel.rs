//! Cooperative cancellation.

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable flag that stops new submissions once raised.
///
/// Work already in flight is allowed to finish; callers check
/// [`is_cancelled`](Self::is_cancelled) before starting anything new or
/// await [`cancelled`](Self::cancelled) inside a `select!`.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal has been raised.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // Only errors once the sender is gone, and `self` holds it.
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}
