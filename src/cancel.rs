use std::fmt;
use std::future::Future;
use std::sync::Mutex;

use futures::channel::oneshot;
use futures::future::Shared;
use futures::{FutureExt as _, TryFutureExt as _};

/// Fires a request's [`CancelSignal`]. Dropping the handle fires it too.
pub struct CancelHandle {
    tx: Mutex<Option<oneshot::Sender<()>>>,
}

/// Observes cancellation of the request that owns a loader.
#[derive(Clone)]
pub struct CancelSignal {
    rx: Shared<oneshot::Receiver<()>>,
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = oneshot::channel();
    (
        CancelHandle {
            tx: Mutex::new(Some(tx)),
        },
        CancelSignal { rx: rx.shared() },
    )
}

impl CancelHandle {
    pub fn cancel(&self) {
        let tx = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        self.rx.clone().now_or_never().is_some()
    }

    /// Resolves once the request is cancelled or its handle is dropped.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Unpin + Send + 'static {
        self.rx.clone().unwrap_or_else(|_| ())
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle").finish_non_exhaustive()
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
