use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use crate::Result;
use crate::error::BusySnafu;

/// Allows one submission at a time.
///
/// The permit lives as long as the submitted future, so it is released on
/// completion, on error and when the caller drops the future.
#[derive(Clone, Default)]
pub struct SingleFlight {
    lock: Arc<Mutex<()>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Runs the future unless another one is in flight, in which case it
    /// fails with `Error::Busy` without polling it.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let Ok(_permit) = self.lock.try_lock() else {
            return BusySnafu.fail();
        };
        fut.await
    }
}

/// Lifetime of a view, late results are dropped once it closes
#[derive(Clone)]
pub struct ViewScope {
    closed: Arc<watch::Sender<bool>>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            closed: Arc::new(tx),
        }
    }

    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves to `None` if the scope closes before the future completes
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut rx = self.closed.subscribe();
        if self.is_closed() {
            return None;
        }

        let closed = async move {
            while rx.changed().await.is_ok() {
                if *rx.borrow_and_update() {
                    return;
                }
            }
            std::future::pending::<()>().await
        };

        tokio::select! {
            out = fut => {
                if self.is_closed() { None } else { Some(out) }
            }
            _ = closed => None,
        }
    }
}
