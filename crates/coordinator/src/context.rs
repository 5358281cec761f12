use std::{fmt, rc::Rc};

use serde::Serialize;
use shared::{Route, RouteAction, Tag};
use store::RouteStore;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::stage::Stage;

const EVENT_CAPACITY: usize = 256;

/// Observable navigation facts, published on the context's event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    UnroutableSegment {
        coordinator: String,
        segment: String,
        route: Route,
    },
    RouteQueued {
        coordinator: String,
        route: Option<Route>,
        depth: usize,
    },
    TransitionSuperseded {
        coordinator: String,
        request: String,
    },
    Presented {
        coordinator: String,
        tag: Tag,
    },
    Dismissed {
        coordinator: String,
        tag: Tag,
    },
    SceneChanged {
        coordinator: String,
        scene: String,
    },
    Rendered {
        route: Route,
    },
}

/// Everything a coordinator needs from its surroundings, handed to every
/// constructor.
#[derive(Clone)]
pub struct NavigationContext {
    stage: Rc<dyn Stage>,
    store: Option<Rc<dyn RouteStore>>,
    events: broadcast::Sender<NavigationEvent>,
}

impl NavigationContext {
    pub fn new(stage: Rc<dyn Stage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            stage,
            store: None,
            events,
        }
    }

    pub fn with_store(mut self, store: Rc<dyn RouteStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn stage(&self) -> Rc<dyn Stage> {
        self.stage.clone()
    }

    /// Forwards a user-initiated route change to the store, if there is one.
    pub fn request_route(&self, action: RouteAction) {
        match &self.store {
            Some(store) => store.set_route(action),
            None => debug!(
                action = action.name(),
                "context: no store attached, route request dropped"
            ),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<NavigationEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: NavigationEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub fn report_unroutable(&self, coordinator: &str, segment: &str, route: &Route) {
        warn!(
            coordinator,
            segment,
            route = %route,
            "routing: ignoring unroutable segment"
        );
        self.emit(NavigationEvent::UnroutableSegment {
            coordinator: coordinator.to_string(),
            segment: segment.to_string(),
            route: route.clone(),
        });
    }
}

impl fmt::Debug for NavigationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationContext")
            .field("store", &self.store.is_some())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}
