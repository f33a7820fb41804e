//! Cooperative cancellation for in-flight state requests.
//!
//! An `AbortController` owns a `watch` channel; every `AbortSignal` handed out
//! observes it. Transports race their request against
//! [`AbortSignal::aborted`] and report `HttpError::Cancelled` when it wins.

use tokio::sync::watch;

/// Owner side: call [`abort`](Self::abort) to cancel every request carrying
/// one of its signals.
#[derive(Debug)]
pub struct AbortController {
    abort_tx: watch::Sender<bool>,
    abort_rx: watch::Receiver<bool>,
}

impl AbortController {
    pub fn new() -> Self {
        let (abort_tx, abort_rx) = watch::channel(false);
        Self { abort_tx, abort_rx }
    }

    /// A signal observing this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            abort_rx: self.abort_rx.clone(),
        }
    }

    /// Abort all requests carrying this controller's signals.
    pub fn abort(&self) {
        let _ = self.abort_tx.send(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.abort_rx.borrow()
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side, cheap to clone and pass down to the transport.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    abort_rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.abort_rx.borrow()
    }

    /// Resolves once the controller aborts. Never resolves if the controller
    /// is dropped without aborting.
    pub async fn aborted(&self) {
        let mut abort_rx = self.abort_rx.clone();
        loop {
            if *abort_rx.borrow_and_update() {
                return;
            }
            if abort_rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
