use std::{cell::RefCell, future::Future, rc::Rc};

use shared::Route;
use tokio::{sync::broadcast, task::LocalSet};

use crate::{
    completion::Completion,
    context::{NavigationContext, NavigationEvent},
    coordinator::Coordinator,
    stage::{HeadlessStage, ViewHandle},
    ui,
};

pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub(crate) fn headless() -> (NavigationContext, Rc<HeadlessStage>) {
    let stage = Rc::new(HeadlessStage::new());
    (NavigationContext::new(stage.clone()), stage)
}

pub(crate) async fn run_local<F: Future>(future: F) -> F::Output {
    LocalSet::new().run_until(future).await
}

/// Lets every task spawned on the UI context run to quiescence.
pub(crate) async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

pub(crate) fn drain(events: &mut broadcast::Receiver<NavigationEvent>) -> Vec<NavigationEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn describe(route: &Option<Route>) -> String {
    match route {
        Some(route) => route.to_string(),
        None => "nil".to_string(),
    }
}

/// Coordinator that only writes down what it is asked to do and completes on
/// the next turn.
pub(crate) struct RecordingCoordinator {
    name: String,
    journal: Journal,
    route: RefCell<Route>,
    view: ViewHandle,
}

impl RecordingCoordinator {
    pub(crate) fn new(name: &str, journal: &Journal) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
            route: RefCell::new(Route::new()),
            view: ViewHandle::new(name),
        })
    }

    fn log(&self, call: &str, route: &Option<Route>) {
        self.journal
            .borrow_mut()
            .push(format!("{}.{call}({})", self.name, describe(route)));
    }
}

impl Coordinator for RecordingCoordinator {
    fn name(&self) -> &str {
        &self.name
    }

    fn route(&self) -> Route {
        self.route.borrow().clone()
    }

    fn start(&self, route: Option<Route>) {
        self.log("start", &route);
        *self.route.borrow_mut() = route.unwrap_or_default();
    }

    fn prepare_for_route(&self, route: Option<Route>, done: Completion) {
        self.log("prepare", &route);
        ui::defer(move || done.complete());
    }

    fn set_route(&self, route: Option<Route>, done: Completion) {
        self.log("set_route", &route);
        *self.route.borrow_mut() = route.unwrap_or_default();
        ui::defer(move || done.complete());
    }

    fn root_view(&self) -> ViewHandle {
        self.view.clone()
    }
}
