//! Navigation-stack coordinator: one linear hierarchy of views, one view per
//! route segment.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use shared::{Route, RouteAction};
use tracing::{debug, info};

use crate::{
    completion::Completion,
    context::NavigationContext,
    coordinator::{Coordinator, StartOnce},
    stage::ViewHandle,
    ui,
};

/// A segment this stack knows how to show, and how to build its view.
#[derive(Clone)]
pub struct StackEntry {
    segment: String,
    build: Rc<dyn Fn() -> ViewHandle>,
}

impl StackEntry {
    pub fn new(segment: impl Into<String>, build: impl Fn() -> ViewHandle + 'static) -> Self {
        Self {
            segment: segment.into(),
            build: Rc::new(build),
        }
    }

    /// Entry whose views are named after the segment.
    pub fn named(segment: impl Into<String>) -> Self {
        let segment = segment.into();
        let view_name = segment.clone();
        Self::new(segment, move || ViewHandle::new(view_name.clone()))
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }
}

impl fmt::Debug for StackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackEntry")
            .field("segment", &self.segment)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct Frame {
    segment: String,
    view: ViewHandle,
}

pub struct StackCoordinator {
    name: String,
    context: NavigationContext,
    stack_view: ViewHandle,
    entries: Vec<StackEntry>,
    frames: RefCell<Vec<Frame>>,
    prepared: RefCell<Vec<Frame>>,
    started: StartOnce,
    me: Weak<StackCoordinator>,
}

impl StackCoordinator {
    /// The first entry is the stack's root, shown when started without a
    /// route or with an empty one.
    pub fn new(
        name: impl Into<String>,
        context: NavigationContext,
        entries: Vec<StackEntry>,
    ) -> Rc<Self> {
        let name = name.into();
        let stack_view = ViewHandle::new(format!("{name}.stack"));
        Rc::new_cyclic(|me| Self {
            name,
            context,
            stack_view,
            entries,
            frames: RefCell::new(Vec::new()),
            prepared: RefCell::new(Vec::new()),
            started: StartOnce::default(),
            me: me.clone(),
        })
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn visible_views(&self) -> Vec<ViewHandle> {
        self.frames
            .borrow()
            .iter()
            .map(|frame| frame.view.clone())
            .collect()
    }

    pub fn prepared_segments(&self) -> Vec<String> {
        self.prepared
            .borrow()
            .iter()
            .map(|frame| frame.segment.clone())
            .collect()
    }

    /// The user popped the top view (back gesture). The view is already gone,
    /// so only the state is updated and the store is told about it.
    pub fn did_pop_interactively(&self) {
        let popped = {
            let mut frames = self.frames.borrow_mut();
            if frames.len() > 1 {
                frames.pop()
            } else {
                None
            }
        };

        if let Some(frame) = popped {
            info!(coordinator = %self.name, segment = %frame.segment, "stack: interactive pop");
            self.context
                .request_route(RouteAction::Pop(Route::from_segments([frame.segment])));
        }
    }

    /// Routable entries for `route`, in order; unknown segments are reported
    /// and skipped.
    fn resolve(&self, route: &Route) -> Vec<StackEntry> {
        route
            .iter()
            .filter_map(|segment| {
                let entry = self.entries.iter().find(|entry| entry.segment == segment);
                if entry.is_none() {
                    self.context.report_unroutable(&self.name, segment, route);
                }
                entry.cloned()
            })
            .collect()
    }

    fn build_frames(&self, entries: &[StackEntry], prepared: &mut Vec<Frame>) -> Vec<Frame> {
        entries
            .iter()
            .map(|entry| {
                match prepared
                    .iter()
                    .position(|frame| frame.segment == entry.segment)
                {
                    Some(index) => prepared.remove(index),
                    None => Frame {
                        segment: entry.segment.clone(),
                        view: (entry.build)(),
                    },
                }
            })
            .collect()
    }

    fn current_segments(&self) -> Vec<String> {
        self.frames
            .borrow()
            .iter()
            .map(|frame| frame.segment.clone())
            .collect()
    }
}

impl Coordinator for StackCoordinator {
    fn name(&self) -> &str {
        &self.name
    }

    fn route(&self) -> Route {
        Route::from_segments(self.frames.borrow().iter().map(|frame| &frame.segment))
    }

    fn start(&self, route: Option<Route>) {
        if !self.started.begin(&self.name) {
            return;
        }

        let entries = match route.filter(|route| !route.is_empty()) {
            Some(route) => self.resolve(&route),
            None => self.entries.iter().take(1).cloned().collect(),
        };
        let frames = self.build_frames(&entries, &mut Vec::new());
        let views: Vec<ViewHandle> = frames.iter().map(|frame| frame.view.clone()).collect();
        *self.frames.borrow_mut() = frames;
        debug!(coordinator = %self.name, route = %self.route(), "stack: started");

        let stage = self.context.stage();
        let stack_view = self.stack_view.clone();
        ui::after(
            async move { stage.set_stack(&stack_view, &views, false).await },
            || {},
        );
    }

    fn prepare_for_route(&self, route: Option<Route>, done: Completion) {
        let Some(route) = route else {
            self.prepared.borrow_mut().clear();
            done.complete();
            return;
        };

        let entries = self.resolve(&route);
        let current = self.current_segments();
        let keep = entries
            .iter()
            .zip(current.iter())
            .take_while(|(entry, segment)| entry.segment == **segment)
            .count();

        let mut prepared = std::mem::take(&mut *self.prepared.borrow_mut());
        let frames = self.build_frames(&entries[keep..], &mut prepared);
        debug!(
            coordinator = %self.name,
            route = %route,
            prepared = frames.len(),
            "stack: prepared views"
        );
        *self.prepared.borrow_mut() = frames;
        done.complete();
    }

    fn set_route(&self, route: Option<Route>, done: Completion) {
        let entries = match &route {
            Some(route) => self.resolve(route),
            None => Vec::new(),
        };
        let current = self.current_segments();
        let target: Vec<&str> = entries.iter().map(|entry| entry.segment()).collect();
        if current.iter().map(String::as_str).eq(target.iter().copied()) {
            done.complete();
            return;
        }

        let keep = current
            .iter()
            .zip(target.iter())
            .take_while(|(current, target)| current.as_str() == **target)
            .count();

        let mut next: Vec<Frame> = self.frames.borrow()[..keep].to_vec();
        let mut prepared = std::mem::take(&mut *self.prepared.borrow_mut());
        next.extend(self.build_frames(&entries[keep..], &mut prepared));
        let views: Vec<ViewHandle> = next.iter().map(|frame| frame.view.clone()).collect();

        info!(
            coordinator = %self.name,
            from = %self.route(),
            to = %Route::from_segments(&target),
            "stack: transition"
        );

        let stage = self.context.stage();
        let stack_view = self.stack_view.clone();
        let me = self.me.clone();
        ui::after(
            async move { stage.set_stack(&stack_view, &views, true).await },
            move || {
                if let Some(this) = me.upgrade() {
                    *this.frames.borrow_mut() = next;
                }
                done.complete();
            },
        );
    }

    fn root_view(&self) -> ViewHandle {
        self.stack_view.clone()
    }
}

#[cfg(test)]
#[path = "tests/stack_tests.rs"]
mod tests;
