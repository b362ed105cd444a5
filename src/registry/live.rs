//! The router currently serving traffic.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

/// Shared handle to the published router.
///
/// The API publishes a freshly built router after every successful
/// registration; in-flight requests keep the router they started with.
#[derive(Clone)]
pub struct LiveRoutes {
    current: Arc<ArcSwap<Router>>,
}

impl LiveRoutes {
    pub(crate) fn new(router: Router) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(router)),
        }
    }

    pub(crate) fn publish(&self, router: Router) {
        self.current.store(Arc::new(router));
    }

    /// The router serving new requests.
    pub fn router(&self) -> Router {
        self.current.load().as_ref().clone()
    }
}

/// Hand a request to whichever router is live right now.
pub async fn dispatch(State(live): State<LiveRoutes>, request: Request) -> Response {
    match live.router().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
