//! A coordinator with a root coordinator and one modal slot.
//!
//! The route of a [`PresentingCoordinator`] is the root's route followed by
//! the presented coordinator's route, and the presented part always starts
//! with the presentable's tag:
//!
//! ```text
//! root: [signIn]   presented "fp": [fp, sent]   =>   [signIn, fp, sent]
//! ```
//!
//! The modal slot is an explicit phase machine
//! (`Idle -> Presenting -> Presented -> Dismissing -> Idle`). Present and
//! dismiss requests that arrive while the slot is mid-transition are parked in
//! a single deferred slot and replayed on the turn after the transition ends.
//! `set_route` calls are serialized: one runs at a time, the rest queue FIFO.

use std::{
    cell::RefCell,
    collections::HashSet,
    rc::{Rc, Weak},
};

use shared::{NavigationError, Route, Tag};
use tracing::{debug, info};

use crate::{
    completion::Completion,
    context::{NavigationContext, NavigationEvent},
    coordinator::{Coordinator, GeneratingScene, Scene, SharedCoordinator, StartOnce},
    group::CompletionGroup,
    queue::RouteQueue,
    stage::ViewHandle,
    ui,
};

/// Result of matching a route against the presentable registry.
#[derive(Debug, Clone)]
pub struct ParsedRoute {
    pub root: Route,
    pub presented: Option<Route>,
    pub presentable: Option<GeneratingScene>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationPhase {
    Idle,
    Presenting,
    Presented,
    Dismissing,
}

enum Slot {
    Idle,
    Presenting { tag: Tag },
    Presented(Scene),
    Dismissing(Scene),
}

enum Deferred {
    Present {
        presentable: GeneratingScene,
        route: Route,
        done: Completion,
    },
    Dismiss {
        done: Completion,
    },
}

impl Deferred {
    fn describe(&self) -> String {
        match self {
            Deferred::Present {
                presentable, route, ..
            } => format!("present {} ({route})", presentable.tag()),
            Deferred::Dismiss { .. } => "dismiss".to_string(),
        }
    }

    fn into_done(self) -> Completion {
        match self {
            Deferred::Present { done, .. } | Deferred::Dismiss { done } => done,
        }
    }
}

pub struct PresentingCoordinator {
    name: String,
    context: NavigationContext,
    root: SharedCoordinator,
    presentables: Vec<GeneratingScene>,
    slot: RefCell<Slot>,
    deferred: RefCell<Option<Deferred>>,
    queue: RouteQueue,
    started: StartOnce,
    me: Weak<PresentingCoordinator>,
}

impl PresentingCoordinator {
    /// Fails when two presentables share a tag.
    pub fn new(
        name: impl Into<String>,
        context: NavigationContext,
        root: SharedCoordinator,
        presentables: Vec<GeneratingScene>,
    ) -> Result<Rc<Self>, NavigationError> {
        let mut seen = HashSet::new();
        for presentable in &presentables {
            if !seen.insert(presentable.tag().clone()) {
                return Err(NavigationError::DuplicateTag {
                    tag: presentable.tag().to_string(),
                });
            }
        }

        let name = name.into();
        Ok(Rc::new_cyclic(|me| Self {
            name,
            context,
            root,
            presentables,
            slot: RefCell::new(Slot::Idle),
            deferred: RefCell::new(None),
            queue: RouteQueue::default(),
            started: StartOnce::default(),
            me: me.clone(),
        }))
    }

    pub fn root(&self) -> &SharedCoordinator {
        &self.root
    }

    pub fn presentables(&self) -> &[GeneratingScene] {
        &self.presentables
    }

    /// The scene whose route is part of [`route`](Coordinator::route): the
    /// installed scene, including while it is being dismissed.
    pub fn presented(&self) -> Option<Scene> {
        match &*self.slot.borrow() {
            Slot::Presented(scene) | Slot::Dismissing(scene) => Some(scene.clone()),
            Slot::Idle | Slot::Presenting { .. } => None,
        }
    }

    pub fn phase(&self) -> PresentationPhase {
        match &*self.slot.borrow() {
            Slot::Idle => PresentationPhase::Idle,
            Slot::Presenting { .. } => PresentationPhase::Presenting,
            Slot::Presented(_) => PresentationPhase::Presented,
            Slot::Dismissing(_) => PresentationPhase::Dismissing,
        }
    }

    /// Registration order breaks ties: the first presentable whose tag occurs
    /// in `route` wins.
    pub fn parse_presentable_route(&self, route: &Route) -> ParsedRoute {
        for presentable in &self.presentables {
            if let Some((root, presented)) = route.split(presentable.tag()) {
                return ParsedRoute {
                    root,
                    presented: Some(presented),
                    presentable: Some(presentable.clone()),
                };
            }
        }
        ParsedRoute {
            root: route.clone(),
            presented: None,
            presentable: None,
        }
    }

    /// Presents `presentable` at `route`.
    ///
    /// Updates the route of an already presented scene with the same tag, and
    /// dismisses a scene with a different tag before presenting on a later
    /// turn.
    pub fn present(&self, presentable: GeneratingScene, route: Route, done: Completion) {
        enum Next {
            Fresh,
            Update(SharedCoordinator),
            Switch(Tag),
            Park,
        }

        let next = match &*self.slot.borrow() {
            Slot::Idle => Next::Fresh,
            Slot::Presented(scene) if scene.tag == *presentable.tag() => {
                Next::Update(scene.coordinator.clone())
            }
            Slot::Presented(scene) => Next::Switch(scene.tag.clone()),
            Slot::Presenting { .. } | Slot::Dismissing(_) => Next::Park,
        };

        match next {
            Next::Fresh => self.begin_presentation(presentable, route, done),
            Next::Update(coordinator) => {
                debug!(
                    coordinator = %self.name,
                    tag = %presentable.tag(),
                    route = %route,
                    "presenting: updating presented scene"
                );
                coordinator.set_route(Some(route), done);
            }
            Next::Switch(current) => {
                info!(
                    coordinator = %self.name,
                    from = %current,
                    to = %presentable.tag(),
                    "presenting: switching presented scene"
                );
                self.park(Deferred::Present {
                    presentable,
                    route,
                    done,
                });
                self.dismiss(Completion::noop());
            }
            Next::Park => self.park(Deferred::Present {
                presentable,
                route,
                done,
            }),
        }
    }

    /// Dismisses the presented scene; signals `done` right away when nothing
    /// is presented.
    pub fn dismiss(&self, done: Completion) {
        enum Next {
            Nothing,
            Begin(Scene),
            Park,
        }

        let next = match &*self.slot.borrow() {
            Slot::Idle => Next::Nothing,
            Slot::Presented(scene) => Next::Begin(scene.clone()),
            Slot::Presenting { .. } | Slot::Dismissing(_) => Next::Park,
        };

        match next {
            Next::Nothing => done.complete(),
            Next::Park => self.park(Deferred::Dismiss { done }),
            Next::Begin(scene) => self.begin_dismissal(scene, done),
        }
    }

    fn begin_presentation(&self, presentable: GeneratingScene, route: Route, done: Completion) {
        let tag = presentable.tag().clone();
        let coordinator = presentable.build_coordinator();
        coordinator.start(Some(route));
        *self.slot.borrow_mut() = Slot::Presenting { tag: tag.clone() };
        info!(coordinator = %self.name, tag = %tag, "presenting: presenting scene");

        let stage = self.context.stage();
        let parent = self.root.root_view();
        let modal = coordinator.root_view();
        let me = self.me.clone();
        ui::after(
            async move { stage.present_modal(&parent, &modal).await },
            move || {
                let Some(this) = me.upgrade() else {
                    done.complete();
                    return;
                };
                *this.slot.borrow_mut() = Slot::Presented(Scene {
                    tag: tag.clone(),
                    coordinator,
                });
                info!(coordinator = %this.name, tag = %tag, "presenting: scene installed");
                this.context.emit(NavigationEvent::Presented {
                    coordinator: this.name.clone(),
                    tag,
                });
                done.complete();
                this.replay_deferred();
            },
        );
    }

    fn begin_dismissal(&self, scene: Scene, done: Completion) {
        *self.slot.borrow_mut() = Slot::Dismissing(scene.clone());
        info!(coordinator = %self.name, tag = %scene.tag, "presenting: dismissing scene");

        let presented = scene.coordinator.clone();
        let me = self.me.clone();
        presented.prepare_for_route(
            None,
            Completion::new("presenting.dismiss", move || {
                let Some(this) = me.upgrade() else {
                    done.complete();
                    return;
                };
                let stage = this.context.stage();
                let modal: ViewHandle = scene.coordinator.root_view();
                let me = Rc::downgrade(&this);
                ui::after(
                    async move { stage.dismiss_modal(&modal).await },
                    move || {
                        let Some(this) = me.upgrade() else {
                            done.complete();
                            return;
                        };
                        *this.slot.borrow_mut() = Slot::Idle;
                        let Scene { tag, .. } = scene;
                        info!(coordinator = %this.name, tag = %tag, "presenting: scene removed");
                        this.context.emit(NavigationEvent::Dismissed {
                            coordinator: this.name.clone(),
                            tag,
                        });
                        done.complete();
                        this.replay_deferred();
                    },
                );
            }),
        );
    }

    fn park(&self, request: Deferred) {
        debug!(
            coordinator = %self.name,
            request = %request.describe(),
            "presenting: deferring request until the current transition ends"
        );
        let superseded = self.deferred.borrow_mut().replace(request);
        if let Some(old) = superseded {
            let request = old.describe();
            info!(
                coordinator = %self.name,
                request = %request,
                "presenting: deferred request superseded"
            );
            self.context.emit(NavigationEvent::TransitionSuperseded {
                coordinator: self.name.clone(),
                request,
            });
            old.into_done().complete();
        }
    }

    fn replay_deferred(&self) {
        if self.deferred.borrow().is_none() {
            return;
        }
        let me = self.me.clone();
        ui::defer(move || {
            let Some(this) = me.upgrade() else {
                return;
            };
            let Some(request) = this.deferred.borrow_mut().take() else {
                return;
            };
            match request {
                Deferred::Present {
                    presentable,
                    route,
                    done,
                } => this.present(presentable, route, done),
                Deferred::Dismiss { done } => this.dismiss(done),
            }
        });
    }

    fn run_route(&self, route: Option<Route>, done: Completion) {
        let me = self.me.clone();
        let done = Completion::new("presenting.set_route", move || {
            done.complete();
            if let Some(this) = me.upgrade() {
                this.finish_route();
            }
        });

        let Some(route) = route else {
            self.dismiss(done);
            return;
        };

        if route == self.route() {
            debug!(coordinator = %self.name, route = %route, "presenting: route unchanged");
            done.complete();
            return;
        }

        let ParsedRoute {
            root,
            presented,
            presentable,
        } = self.parse_presentable_route(&route);

        let group = CompletionGroup::new("presenting.set_route");
        let root_done = group.enter();
        let modal_done = group.enter();

        self.root.set_route(Some(root), root_done);
        match (presentable, presented) {
            (Some(presentable), Some(presented)) => {
                self.present(presentable, presented, modal_done)
            }
            _ => self.dismiss(modal_done),
        }
        group.notify(done);
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

impl Coordinator for PresentingCoordinator {
    fn name(&self) -> &str {
        &self.name
    }

    fn route(&self) -> Route {
        let presented = self.presented().map(|scene| scene.coordinator);
        let root = self.root.route();
        match presented {
            Some(coordinator) => root.concat(&coordinator.route()),
            None => root,
        }
    }

    fn start(&self, route: Option<Route>) {
        if !self.started.begin(&self.name) {
            return;
        }
        let Some(route) = route else {
            self.root.start(None);
            return;
        };

        let parsed = self.parse_presentable_route(&route);
        self.root.start(Some(parsed.root));
        if let (Some(presentable), Some(presented)) = (parsed.presentable, parsed.presented) {
            self.present(presentable, presented, Completion::noop());
        }
    }

    fn prepare_for_route(&self, route: Option<Route>, done: Completion) {
        let Some(route) = route else {
            self.dismiss(done);
            return;
        };

        let parsed = self.parse_presentable_route(&route);
        let presented = match &*self.slot.borrow() {
            Slot::Presented(scene) => Some(scene.clone()),
            _ => None,
        };

        let group = CompletionGroup::new("presenting.prepare_for_route");
        let root_done = group.enter();
        let modal_done = presented.as_ref().map(|_| group.enter());

        self.root.prepare_for_route(Some(parsed.root), root_done);
        if let (Some(scene), Some(modal_done)) = (presented, modal_done) {
            match parsed.presented {
                Some(route) => scene.coordinator.prepare_for_route(Some(route), modal_done),
                None => self.dismiss(modal_done),
            }
        }
        group.notify(done);
    }

    fn set_route(&self, route: Option<Route>, done: Completion) {
        if let Some((route, done)) = self.queue.admit(&self.name, &self.context, route, done) {
            self.run_route(route, done);
        }
    }

    fn root_view(&self) -> ViewHandle {
        self.root.root_view()
    }
}

#[cfg(test)]
#[path = "tests/presenting_tests.rs"]
mod tests;
