//! Route-driven coordinators.
//!
//! Navigation state is a [`Route`](shared::Route) kept in a store. A tree of
//! [`Coordinator`]s turns route changes into view changes on a [`Stage`]:
//! [`PresentingCoordinator`] for a root plus one modal, [`StackCoordinator`]
//! for linear push/pop hierarchies and [`SceneCoordinator`] for switching
//! whole scenes.
//!
//! Everything here runs on one thread inside a `tokio::task::LocalSet`.

pub mod completion;
pub mod context;
pub mod coordinator;
pub mod driver;
pub mod group;
pub mod presenting;
mod queue;
pub mod stack;
pub mod stage;
pub mod switcher;
pub mod ui;

pub use completion::{channel, Completion, Transition};
pub use context::{NavigationContext, NavigationEvent};
pub use coordinator::{Coordinator, GeneratingScene, Scene, SharedCoordinator};
pub use driver::RouteDriver;
pub use group::{CompletionGroup, GroupToken};
pub use presenting::{ParsedRoute, PresentationPhase, PresentingCoordinator};
pub use stack::{StackCoordinator, StackEntry};
pub use stage::{HeadlessStage, Stage, StageEvent, ViewHandle};
pub use switcher::{SceneCoordinator, SceneEntry};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
