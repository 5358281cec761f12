//! Value types shared by the store, the coordinators and the demo app.

pub mod action;
pub mod domain;
pub mod error;
pub mod route;

pub use action::RouteAction;
pub use domain::{Tag, ViewId};
pub use error::NavigationError;
pub use route::{Route, ROUTE_DELIMITER};
