//! Fan-out/fan-in for the concurrent legs of one transition.
//!
//! ```ignore
//! let group = CompletionGroup::new("presenting.set_route");
//! let root_done = group.enter();
//! let modal_done = group.enter();
//! root.set_route(Some(root_route), root_done);
//! presenting.dismiss(modal_done);
//! group.notify(done);
//! ```
//!
//! The group holds one implicit entry from construction until [`notify`],
//! so legs that finish synchronously while later legs are still being entered
//! can never drive the count to zero early. `notify` consumes the group,
//! which rules out entering after the wait has begun.
//!
//! [`notify`]: CompletionGroup::notify

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};

use tokio::sync::oneshot;
use tracing::{error, trace};

use crate::completion::Completion;

struct GroupState {
    label: &'static str,
    outstanding: AtomicUsize,
    signal: Mutex<Option<oneshot::Sender<()>>>,
}

impl GroupState {
    fn leave(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        assert!(
            previous > 0,
            "completion group `{}` left more often than entered",
            self.label
        );
        if previous == 1 {
            let sender = self
                .signal
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(sender) = sender {
                let _ = sender.send(());
            }
        }
    }
}

pub struct CompletionGroup {
    state: Arc<GroupState>,
    signal: oneshot::Receiver<()>,
}

impl CompletionGroup {
    pub fn new(label: &'static str) -> Self {
        let (sender, signal) = oneshot::channel();
        Self {
            state: Arc::new(GroupState {
                label,
                outstanding: AtomicUsize::new(1),
                signal: Mutex::new(Some(sender)),
            }),
            signal,
        }
    }

    pub fn label(&self) -> &'static str {
        self.state.label
    }

    /// Declares one more leg and returns the completion that leg must signal.
    pub fn enter(&self) -> Completion {
        let token = self.enter_token();
        Completion::new(self.state.label, move || token.leave())
    }

    /// Like [`enter`](Self::enter), but returns a `Send` token so the leg can
    /// finish on another thread.
    pub fn enter_token(&self) -> GroupToken {
        self.state.outstanding.fetch_add(1, Ordering::AcqRel);
        GroupToken {
            state: Some(self.state.clone()),
        }
    }

    /// Legs entered but not yet left.
    pub fn outstanding(&self) -> usize {
        self.state
            .outstanding
            .load(Ordering::Acquire)
            .saturating_sub(1)
    }

    /// Releases the group's own entry and arranges for `done` to run on the UI
    /// context once every leg has left. Must be called from inside the
    /// `LocalSet` driving the coordinators.
    pub fn notify(self, done: Completion) {
        let CompletionGroup { state, signal } = self;
        let label = state.label;
        trace!(
            group = label,
            outstanding = state.outstanding.load(Ordering::Acquire) - 1,
            "completion group: waiting"
        );
        state.leave();
        drop(state);

        tokio::task::spawn_local(async move {
            if signal.await.is_err() {
                error!(group = label, "completion group: signal lost, completing anyway");
            }
            done.complete();
        });
    }
}

/// Proof of one entry into a [`CompletionGroup`]; leaving consumes it.
pub struct GroupToken {
    state: Option<Arc<GroupState>>,
}

impl GroupToken {
    pub fn leave(mut self) {
        if let Some(state) = self.state.take() {
            state.leave();
        }
    }
}

impl Drop for GroupToken {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            if !std::thread::panicking() {
                error!(group = state.label, "completion group: token dropped without leaving");
            }
            state.leave();
        }
    }
}

#[cfg(test)]
#[path = "tests/group_tests.rs"]
mod tests;
