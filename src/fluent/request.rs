//! Request handling middleware: request ID.

use super::router::FluentRouter;
use crate::HttpMiddleware;

use {
    crate::utils::{RequestIdGenerator, X_REQUEST_ID},
    http::HeaderName,
    tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up request ID generation and propagation.
    ///
    /// Adds two middleware layers:
    /// 1. Generates or preserves `x-request-id` headers
    /// 2. Propagates the request ID to response headers
    ///
    /// New IDs are UUIDv7 values. If a request already has an `x-request-id`
    /// header, it is preserved. The logging middleware picks the ID up as the
    /// `request_id` field.
    #[must_use]
    pub fn setup_request_id(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::RequestId) {
            return self;
        }

        let x_request_id = HeaderName::from_static(X_REQUEST_ID);
        self.inner = self
            .inner
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                RequestIdGenerator,
            ))
            .layer(PropagateRequestIdLayer::new(x_request_id));
        self
    }
}
