//! Scheduling on the UI context.
//!
//! The UI context is whatever `LocalSet` drives the coordinators; all helpers
//! here must be called from inside it.

use std::future::Future;

/// Runs `f` on a later turn of the UI context.
pub fn defer(f: impl FnOnce() + 'static) {
    tokio::task::spawn_local(async move {
        f();
    });
}

/// Drives an asynchronous visual effect and runs `then` on the UI context
/// once it has finished.
pub fn after<F>(effect: F, then: impl FnOnce() + 'static)
where
    F: Future<Output = ()> + 'static,
{
    tokio::task::spawn_local(async move {
        effect.await;
        then();
    });
}
