//! Top-level scene switching: the first route segment picks which child
//! coordinator fills the container, the rest of the route is delegated to it.
//!
//! Route changes run one at a time. A change that arrives while a scene is
//! still being switched in waits for the switch, so it is delegated to that
//! scene instead of building another one.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use shared::{NavigationError, Route};
use tracing::{debug, error, info};

use crate::{
    completion::Completion,
    context::{NavigationContext, NavigationEvent},
    coordinator::{Coordinator, SharedCoordinator, StartOnce},
    queue::RouteQueue,
    stage::ViewHandle,
    ui,
};

type SceneFactory = dyn Fn() -> Result<SharedCoordinator, NavigationError>;

/// A scene reachable under `prefix`; the factory runs on every switch to it.
#[derive(Clone)]
pub struct SceneEntry {
    prefix: String,
    build: Rc<SceneFactory>,
}

impl SceneEntry {
    pub fn new(
        prefix: impl Into<String>,
        build: impl Fn() -> Result<SharedCoordinator, NavigationError> + 'static,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            build: Rc::new(build),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Debug for SceneEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneEntry")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct ActiveScene {
    prefix: String,
    coordinator: SharedCoordinator,
}

pub struct SceneCoordinator {
    name: String,
    context: NavigationContext,
    container: ViewHandle,
    entries: Vec<SceneEntry>,
    current: RefCell<Option<ActiveScene>>,
    queue: RouteQueue,
    started: StartOnce,
    me: Weak<SceneCoordinator>,
}

impl SceneCoordinator {
    /// Without an initial route, `start` shows the first entry.
    pub fn new(
        name: impl Into<String>,
        context: NavigationContext,
        entries: Vec<SceneEntry>,
    ) -> Rc<Self> {
        let name = name.into();
        let container = ViewHandle::new(format!("{name}.container"));
        Rc::new_cyclic(|me| Self {
            name,
            context,
            container,
            entries,
            current: RefCell::new(None),
            queue: RouteQueue::default(),
            started: StartOnce::default(),
            me: me.clone(),
        })
    }

    pub fn current_scene(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .map(|scene| scene.prefix.clone())
    }

    pub fn current_coordinator(&self) -> Option<SharedCoordinator> {
        self.current
            .borrow()
            .as_ref()
            .map(|scene| scene.coordinator.clone())
    }

    fn switch_to(&self, entry: &SceneEntry, route: Route, done: Completion) {
        let coordinator = match (entry.build)() {
            Ok(coordinator) => coordinator,
            Err(err) => {
                error!(
                    coordinator = %self.name,
                    scene = %entry.prefix,
                    %err,
                    "scenes: failed to build scene"
                );
                done.complete();
                return;
            }
        };
        coordinator.start(Some(route));

        let old = self.current_coordinator().map(|scene| scene.root_view());
        let new = coordinator.root_view();
        info!(
            coordinator = %self.name,
            from = ?self.current_scene(),
            to = %entry.prefix,
            "scenes: switching scene"
        );

        let stage = self.context.stage();
        let container = self.container.clone();
        let me = self.me.clone();
        let scene = ActiveScene {
            prefix: entry.prefix.clone(),
            coordinator,
        };
        ui::after(
            async move {
                stage
                    .replace_child(&container, old.as_ref(), Some(&new))
                    .await
            },
            move || {
                if let Some(this) = me.upgrade() {
                    this.context.emit(NavigationEvent::SceneChanged {
                        coordinator: this.name.clone(),
                        scene: scene.prefix.clone(),
                    });
                    *this.current.borrow_mut() = Some(scene);
                }
                done.complete();
            },
        );
    }

    fn clear(&self, done: Completion) {
        let Some(old) = self.current_coordinator() else {
            done.complete();
            return;
        };

        info!(coordinator = %self.name, "scenes: clearing container");
        let stage = self.context.stage();
        let container = self.container.clone();
        let old_view = old.root_view();
        let me = self.me.clone();
        ui::after(
            async move { stage.replace_child(&container, Some(&old_view), None).await },
            move || {
                if let Some(this) = me.upgrade() {
                    *this.current.borrow_mut() = None;
                }
                drop(old);
                done.complete();
            },
        );
    }

    fn run_route(&self, route: Option<Route>, done: Completion) {
        let me = self.me.clone();
        let done = done.after("scenes.set_route", move || {
            if let Some(this) = me.upgrade() {
                this.finish_route();
            }
        });

        let Some(route) = route.filter(|route| !route.is_empty()) else {
            self.clear(done);
            return;
        };
        let Some(prefix) = route.first() else {
            self.clear(done);
            return;
        };

        let current = self.current.borrow().clone();
        if let Some(scene) = current.filter(|scene| scene.prefix == prefix) {
            scene.coordinator.set_route(Some(route.skip(1)), done);
            return;
        }

        match self.entries.iter().find(|entry| entry.prefix == prefix) {
            Some(entry) => self.switch_to(entry, route.skip(1), done),
            None => {
                self.context.report_unroutable(&self.name, prefix, &route);
                done.complete();
            }
        }
    }

    fn finish_route(&self) {
        if let Some((route, done)) = self.queue.next() {
            let me = self.me.clone();
            ui::defer(move || {
                if let Some(this) = me.upgrade() {
                    this.run_route(route, done);
                }
            });
        }
    }
}

impl Coordinator for SceneCoordinator {
    fn name(&self) -> &str {
        &self.name
    }

    fn route(&self) -> Route {
        let current = self.current.borrow().clone();
        match current {
            Some(scene) => Route::from_segments([scene.prefix]).concat(&scene.coordinator.route()),
            None => Route::new(),
        }
    }

    fn start(&self, route: Option<Route>) {
        if !self.started.begin(&self.name) {
            return;
        }
        let route = route.filter(|route| !route.is_empty()).or_else(|| {
            self.entries
                .first()
                .map(|entry| Route::from_segments([entry.prefix.as_str()]))
        });
        self.set_route(route, Completion::noop());
    }

    fn prepare_for_route(&self, route: Option<Route>, done: Completion) {
        let current = self.current.borrow().clone();
        let Some(scene) = current else {
            done.complete();
            return;
        };

        match route {
            Some(route) if route.first() == Some(scene.prefix.as_str()) => {
                scene.coordinator.prepare_for_route(Some(route.skip(1)), done)
            }
            Some(route) => {
                debug!(
                    coordinator = %self.name,
                    route = %route,
                    "scenes: nothing to prepare for a scene switch"
                );
                done.complete();
            }
            None => scene.coordinator.prepare_for_route(None, done),
        }
    }

    fn set_route(&self, route: Option<Route>, done: Completion) {
        if let Some((route, done)) = self.queue.admit(&self.name, &self.context, route, done) {
            self.run_route(route, done);
        }
    }

    fn root_view(&self) -> ViewHandle {
        self.container.clone()
    }
}

#[cfg(test)]
#[path = "tests/switcher_tests.rs"]
mod tests;
