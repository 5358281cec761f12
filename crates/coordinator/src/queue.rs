//! FIFO serialization of `set_route` calls.

use std::{cell::RefCell, collections::VecDeque};

use shared::Route;
use tracing::debug;

use crate::{
    completion::Completion,
    context::{NavigationContext, NavigationEvent},
};

pub(crate) type QueuedRoute = (Option<Route>, Completion);

/// At most one route change runs at a time; later ones wait in order.
#[derive(Default)]
pub(crate) struct RouteQueue {
    inner: RefCell<QueueState>,
}

#[derive(Default)]
struct QueueState {
    in_flight: bool,
    waiting: VecDeque<QueuedRoute>,
}

impl RouteQueue {
    /// Hands the request back when nothing is in flight; otherwise parks it
    /// and reports the queue depth on the event bus.
    pub(crate) fn admit(
        &self,
        owner: &str,
        context: &NavigationContext,
        route: Option<Route>,
        done: Completion,
    ) -> Option<QueuedRoute> {
        let depth = {
            let mut state = self.inner.borrow_mut();
            if !state.in_flight {
                state.in_flight = true;
                return Some((route, done));
            }
            state.waiting.push_back((route.clone(), done));
            state.waiting.len()
        };

        debug!(
            coordinator = %owner,
            depth,
            "queue: route change queued behind in-flight transition"
        );
        context.emit(NavigationEvent::RouteQueued {
            coordinator: owner.to_string(),
            route,
            depth,
        });
        None
    }

    /// The next waiting request, or `None` after marking the queue idle.
    pub(crate) fn next(&self) -> Option<QueuedRoute> {
        let mut state = self.inner.borrow_mut();
        let next = state.waiting.pop_front();
        if next.is_none() {
            state.in_flight = false;
        }
        next
    }
}
