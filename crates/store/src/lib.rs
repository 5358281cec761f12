//! The narrow store surface the coordinators consume, plus a single-threaded
//! in-memory store used by the demo app and the tests.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use shared::{Route, RouteAction};
use tokio::sync::watch;
use tracing::debug;

/// What coordinators need from the central store: the current route, a way to
/// request a route change, and a stream of route changes.
pub trait RouteStore {
    fn route(&self) -> Route;
    fn set_route(&self, action: RouteAction);
    fn subscribe_route(&self) -> watch::Receiver<Route>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreState<S> {
    pub route: Route,
    pub app: S,
}

pub type SubscriptionId = usize;

type Reducer<S, A> = Box<dyn Fn(&mut S, A)>;
type Subscriber<S> = Box<dyn FnMut(&StoreState<S>)>;

enum Message<A> {
    Dispatch(A),
    Route(RouteAction),
}

struct Inner<S, A> {
    state: StoreState<S>,
    reducer: Reducer<S, A>,
    subscribers: Vec<(SubscriptionId, Subscriber<S>)>,
    unsubscribed: Vec<SubscriptionId>,
    next_subscription: SubscriptionId,
    queue: VecDeque<Message<A>>,
}

/// Reducer-driven store living on the UI thread.
///
/// Dispatches issued from inside a subscriber are queued and applied after the
/// current notification round, so subscribers always observe states in order.
pub struct MemoryStore<S, A> {
    inner: Rc<RefCell<Inner<S, A>>>,
    draining: Rc<Cell<bool>>,
    routes: Rc<watch::Sender<Route>>,
}

impl<S, A> Clone for MemoryStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            draining: self.draining.clone(),
            routes: self.routes.clone(),
        }
    }
}

impl<S, A> MemoryStore<S, A>
where
    S: Clone + 'static,
    A: 'static,
{
    pub fn new(initial: S, reducer: impl Fn(&mut S, A) + 'static) -> Self {
        Self::with_route(initial, Route::new(), reducer)
    }

    pub fn with_route(initial: S, route: Route, reducer: impl Fn(&mut S, A) + 'static) -> Self {
        let (routes, _) = watch::channel(route.clone());
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: StoreState {
                    route,
                    app: initial,
                },
                reducer: Box::new(reducer),
                subscribers: Vec::new(),
                unsubscribed: Vec::new(),
                next_subscription: 0,
                queue: VecDeque::new(),
            })),
            draining: Rc::new(Cell::new(false)),
            routes: Rc::new(routes),
        }
    }

    pub fn state(&self) -> StoreState<S> {
        self.inner.borrow().state.clone()
    }

    pub fn dispatch(&self, action: A) {
        self.enqueue(Message::Dispatch(action));
    }

    /// Registers `subscriber` with the projection `mapper`.
    ///
    /// The current projection is delivered immediately; afterwards the
    /// subscriber only hears about projections that differ from the last one.
    pub fn subscribe<T, M, F>(&self, mapper: M, mut subscriber: F) -> SubscriptionId
    where
        T: PartialEq + Clone + 'static,
        M: Fn(&StoreState<S>) -> T + 'static,
        F: FnMut(T) + 'static,
    {
        let initial = mapper(&self.inner.borrow().state);
        subscriber(initial.clone());

        let mut last = initial;
        let notify = move |state: &StoreState<S>| {
            let next = mapper(state);
            if next != last {
                last = next.clone();
                subscriber(next);
            }
        };

        let mut inner = self.inner.borrow_mut();
        let id = inner.next_subscription;
        inner.next_subscription += 1;
        inner.subscribers.push((id, Box::new(notify)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(existing, _)| *existing != id);
        if inner.subscribers.len() == before && self.draining.get() {
            // Subscribers are detached while a notification round runs.
            inner.unsubscribed.push(id);
        }
    }

    fn enqueue(&self, message: Message<A>) {
        self.inner.borrow_mut().queue.push_back(message);
        if self.draining.get() {
            return;
        }

        self.draining.set(true);
        while let Some(message) = self.next_message() {
            self.apply(message);
            self.notify();
        }
        self.draining.set(false);
    }

    fn next_message(&self) -> Option<Message<A>> {
        self.inner.borrow_mut().queue.pop_front()
    }

    fn apply(&self, message: Message<A>) {
        let mut inner = self.inner.borrow_mut();
        let Inner { state, reducer, .. } = &mut *inner;
        match message {
            Message::Dispatch(action) => reducer(&mut state.app, action),
            Message::Route(action) => {
                let next = action.apply(&state.route);
                debug!(
                    action = action.name(),
                    from = %state.route,
                    to = %next,
                    "store: route action applied"
                );
                state.route = next;
            }
        }
    }

    fn notify(&self) {
        let snapshot = self.inner.borrow().state.clone();

        self.routes.send_if_modified(|route| {
            if *route == snapshot.route {
                false
            } else {
                *route = snapshot.route.clone();
                true
            }
        });

        let mut subscribers = std::mem::take(&mut self.inner.borrow_mut().subscribers);
        for (_, subscriber) in subscribers.iter_mut() {
            subscriber(&snapshot);
        }

        let mut inner = self.inner.borrow_mut();
        subscribers.append(&mut inner.subscribers);
        let unsubscribed = std::mem::take(&mut inner.unsubscribed);
        subscribers.retain(|(id, _)| !unsubscribed.contains(id));
        inner.subscribers = subscribers;
    }
}

impl<S, A> RouteStore for MemoryStore<S, A>
where
    S: Clone + 'static,
    A: 'static,
{
    fn route(&self) -> Route {
        self.inner.borrow().state.route.clone()
    }

    fn set_route(&self, action: RouteAction) {
        self.enqueue(Message::Route(action));
    }

    fn subscribe_route(&self) -> watch::Receiver<Route> {
        self.routes.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
