//! Cancelable futures.
//!
//! [`make_cancelable`] wraps any future with a [`CancelHandle`]. Once
//! canceled, the wrapper never completes, whatever the inner future yields.
//! Canceling does not abort the inner operation: the wrapper keeps driving
//! it while polled and silently drops its output.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Control for a [`Cancelable`] future.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    canceled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Detach from the wrapped future's outcome. No-op after it completed.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// Future that completes with the inner output unless canceled first.
#[must_use = "futures do nothing unless polled"]
pub struct Cancelable<F: Future> {
    inner: Option<Pin<Box<F>>>,
    handle: CancelHandle,
}

impl<F: Future> Cancelable<F> {
    /// Another handle controlling this future.
    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }
}

/// Wrap `future` so its outcome can be ignored later.
pub fn make_cancelable<F: Future>(future: F) -> (Cancelable<F>, CancelHandle) {
    let handle = CancelHandle::default();
    let cancelable = Cancelable {
        inner: Some(Box::pin(future)),
        handle: handle.clone(),
    };
    (cancelable, handle)
}

impl<F: Future> Future for Cancelable<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Pending;
        };

        match inner.as_mut().poll(cx) {
            Poll::Ready(output) => {
                this.inner = None;
                if this.handle.is_canceled() {
                    tracing::trace!("Canceled future settled, outcome dropped");
                    Poll::Pending
                } else {
                    Poll::Ready(output)
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<F: Future> std::fmt::Debug for Cancelable<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancelable")
            .field("settled", &self.inner.is_none())
            .field("canceled", &self.handle.is_canceled())
            .finish()
    }
}
