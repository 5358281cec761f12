//! Feeds store route changes into the root coordinator.

use futures::StreamExt;
use shared::{NavigationError, Route};
use store::RouteStore;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::{
    completion,
    context::{NavigationContext, NavigationEvent},
    coordinator::SharedCoordinator,
};

pub struct RouteDriver {
    coordinator: SharedCoordinator,
    routes: watch::Receiver<Route>,
    context: NavigationContext,
}

impl RouteDriver {
    pub fn new(
        coordinator: SharedCoordinator,
        store: &dyn RouteStore,
        context: NavigationContext,
    ) -> Self {
        Self {
            coordinator,
            routes: store.subscribe_route(),
            context,
        }
    }

    pub fn coordinator(&self) -> &SharedCoordinator {
        &self.coordinator
    }

    /// Commits `route` on the root coordinator and waits for the transition.
    pub async fn apply(&self, route: Route) -> Result<(), NavigationError> {
        let (done, transition) = completion::channel("driver.apply");
        debug!(route = %route, "driver: applying route");
        self.coordinator.set_route(Some(route.clone()), done);
        transition.await?;

        let rendered = self.coordinator.route();
        if rendered != route {
            warn!(
                requested = %route,
                rendered = %rendered,
                "driver: rendered route differs from the requested one"
            );
        }
        self.context
            .emit(NavigationEvent::Rendered { route: rendered });
        Ok(())
    }

    /// Starts the coordinator at the store's current route, then applies every
    /// later change in order. Returns once the store is gone.
    ///
    /// Each change is awaited before the next one is read. A change that
    /// arrives while the start transition is still running is queued by the
    /// root coordinator behind it.
    pub async fn run(self) -> Result<(), NavigationError> {
        let mut routes = self.routes.clone();
        let initial = routes.borrow_and_update().clone();
        info!(route = %initial, coordinator = self.coordinator.name(), "driver: starting");
        self.coordinator.start(Some(initial));

        let mut changes = WatchStream::from_changes(routes);
        while let Some(route) = changes.next().await {
            self.apply(route).await?;
        }

        info!("driver: route store closed");
        Ok(())
    }
}
