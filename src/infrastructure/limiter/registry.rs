use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::route::{Admission, Route};
use crate::domain::errors::LimitError;

/// Owns one [`Route`] per distinct request path and gates calls before they are sent.
///
/// The map only ever grows. Each route's `(calls, window_end)` pair sits
/// behind its own mutex, so concurrent callers on one route can never be
/// admitted past its limit, and callers on different routes never contend.
#[derive(Default)]
pub struct RouteRegistry {
    routes: RwLock<HashMap<String, Arc<Mutex<Route>>>>,
}

impl RouteRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    async fn route(&self, url: &str) -> Arc<Mutex<Route>> {
        if let Some(route) = self.routes.read().await.get(url) {
            return Arc::clone(route);
        }

        let mut routes = self.routes.write().await;
        let route = routes.entry(url.to_string()).or_insert_with(|| {
            let route = Route::new(url);
            debug!(url, class = ?route.class(), limit = route.limit(), "route registered");
            Arc::new(Mutex::new(route))
        });
        Arc::clone(route)
    }

    /// Admission check for one outbound call.
    ///
    /// Returns [`LimitError::RouteLimitExceeded`] with the wait until the
    /// route's window closes. Never sleeps and never retries.
    pub async fn admit(&self, url: &str) -> Result<(), LimitError> {
        let route = self.route(url).await;
        let mut route = route.lock().await;

        match route.admit(Instant::now()) {
            Admission::Admitted => {
                trace!(url, calls = route.calls(), limit = route.limit(), "route admitted");
                Ok(())
            }
            Admission::Denied { retry_after } => {
                let error = LimitError::RouteLimitExceeded {
                    url: url.to_string(),
                    retry_after,
                };
                warn!(
                    url,
                    limit = route.limit(),
                    retry_after_secs = error.retry_after_secs(),
                    "route limit reached"
                );
                Err(error)
            }
        }
    }

    /// Calls admitted in the route's current window, if the route exists.
    pub async fn calls(&self, url: &str) -> Option<u32> {
        let route = self.routes.read().await.get(url).map(Arc::clone)?;
        let calls = route.lock().await.calls();
        Some(calls)
    }

    /// Number of distinct routes seen so far
    pub async fn len(&self) -> usize {
        self.routes.read().await.len()
    }

    /// Whether no route has been requested yet
    pub async fn is_empty(&self) -> bool {
        self.routes.read().await.is_empty()
    }
}
