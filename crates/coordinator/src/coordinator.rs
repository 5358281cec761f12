use std::{cell::Cell, fmt, rc::Rc};

use shared::{Route, Tag};
use tracing::warn;

use crate::{completion::Completion, stage::ViewHandle};

/// A stateful owner of one slice of the navigation hierarchy.
///
/// All methods run on the UI context. `prepare_for_route` and `set_route`
/// must signal `done` exactly once, possibly on a later turn; `None` means
/// "nothing selected".
pub trait Coordinator {
    fn name(&self) -> &str;

    /// Derived from what is currently on screen, never stored separately.
    fn route(&self) -> Route;

    /// Called once after construction.
    fn start(&self, route: Option<Route>);

    /// Non-committal pre-visit: get content ready without showing it.
    fn prepare_for_route(&self, route: Option<Route>, done: Completion);

    /// Commit: make the visible hierarchy match `route`.
    fn set_route(&self, route: Option<Route>, done: Completion);

    fn root_view(&self) -> ViewHandle;
}

pub type SharedCoordinator = Rc<dyn Coordinator>;

/// A presentable that is currently presented.
#[derive(Clone)]
pub struct Scene {
    pub tag: Tag,
    pub coordinator: SharedCoordinator,
}

impl Scene {
    pub fn route(&self) -> Route {
        self.coordinator.route()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("tag", &self.tag)
            .field("coordinator", &self.coordinator.name())
            .finish()
    }
}

/// Registered factory for a presentable coordinator.
#[derive(Clone)]
pub struct GeneratingScene {
    tag: Tag,
    build: Rc<dyn Fn() -> SharedCoordinator>,
}

impl GeneratingScene {
    pub fn new(tag: impl Into<Tag>, build: impl Fn() -> SharedCoordinator + 'static) -> Self {
        Self {
            tag: tag.into(),
            build: Rc::new(build),
        }
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn build_coordinator(&self) -> SharedCoordinator {
        (self.build)()
    }
}

impl fmt::Debug for GeneratingScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratingScene")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Enforces the call-once contract of [`Coordinator::start`].
#[derive(Debug, Default)]
pub(crate) struct StartOnce(Cell<bool>);

impl StartOnce {
    /// Returns `false` (and logs) when `start` already ran.
    pub(crate) fn begin(&self, coordinator: &str) -> bool {
        if self.0.replace(true) {
            warn!(coordinator, "coordinator: start called more than once, ignoring");
            return false;
        }
        true
    }
}
