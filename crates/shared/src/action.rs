use serde::{Deserialize, Serialize};

use crate::route::Route;

/// Route mutations a coordinator or screen asks the store to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RouteAction {
    Goto(Route),
    Push(Route),
    /// Pops the given segments, but only when the current route ends with them.
    Pop(Route),
    Replace {
        old: Route,
        new: Route,
    },
    Reset,
}

impl RouteAction {
    pub fn apply(&self, current: &Route) -> Route {
        match self {
            RouteAction::Goto(route) => route.clone(),
            RouteAction::Push(segments) => current.pushing(segments),
            RouteAction::Pop(segments) => current.popping(segments),
            RouteAction::Replace { old, new } => {
                if old.is_empty() || !current.ends_with(old) {
                    current.clone()
                } else {
                    current.popping(old).pushing(new)
                }
            }
            RouteAction::Reset => Route::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RouteAction::Goto(_) => "goto",
            RouteAction::Push(_) => "push",
            RouteAction::Pop(_) => "pop",
            RouteAction::Replace { .. } => "replace",
            RouteAction::Reset => "reset",
        }
    }
}

#[cfg(test)]
#[path = "tests/action_tests.rs"]
mod tests;
