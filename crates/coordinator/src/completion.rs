//! One-shot completion callbacks.
//!
//! Every asynchronous coordinator operation takes a [`Completion`]. Signaling
//! consumes it, so a callee can never report twice; a completion dropped
//! without being signaled is logged, and the matching [`Transition`] future
//! resolves to an error instead of hanging.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use shared::NavigationError;
use tokio::sync::oneshot;
use tracing::error;

pub struct Completion {
    label: &'static str,
    callback: Option<Box<dyn FnOnce()>>,
}

impl Completion {
    pub fn new(label: &'static str, callback: impl FnOnce() + 'static) -> Self {
        Self {
            label,
            callback: Some(Box::new(callback)),
        }
    }

    /// A completion nobody waits on.
    pub fn noop() -> Self {
        Self {
            label: "noop",
            callback: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn complete(mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }

    /// Runs `before` and then signals `self`, as a new completion.
    pub fn after(self, label: &'static str, before: impl FnOnce() + 'static) -> Completion {
        Completion::new(label, move || {
            before();
            self.complete();
        })
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.callback.is_some() && !std::thread::panicking() {
            error!(label = self.label, "completion: dropped without being signaled");
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("label", &self.label)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

/// Awaitable side of [`channel`].
#[derive(Debug)]
pub struct Transition {
    label: &'static str,
    receiver: oneshot::Receiver<()>,
}

impl Future for Transition {
    type Output = Result<(), NavigationError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let label = this.label;
        Pin::new(&mut this.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| NavigationError::abandoned(label)))
    }
}

/// Bridges the callback protocol into async code.
pub fn channel(label: &'static str) -> (Completion, Transition) {
    let (sender, receiver) = oneshot::channel();
    let completion = Completion::new(label, move || {
        let _ = sender.send(());
    });
    (completion, Transition { label, receiver })
}

#[cfg(test)]
#[path = "tests/completion_tests.rs"]
mod tests;
