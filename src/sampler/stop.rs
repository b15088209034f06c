//! Stop signal for the sampling loop.

use std::sync::Arc;
use tokio::sync::watch;

/// Creates a connected stop handle and signal.
///
/// # Examples
///
/// ```
/// use padlink::sampler::stop_channel;
///
/// let (handle, signal) = stop_channel();
/// assert!(!signal.is_stopped());
/// handle.stop();
/// assert!(signal.is_stopped());
/// ```
#[must_use]
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

/// Requests that the sampling loop end.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Signals every [`StopSignal`] tied to this handle. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Resolves once stop has been requested.
///
/// If every handle is dropped without stopping, the signal never fires and the
/// loop runs until the process ends.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits for the stop request.
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
