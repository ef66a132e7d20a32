//! Observability middleware: request logging.

use super::{request_log, router::FluentRouter};
use crate::HttpMiddleware;

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up request logging.
    ///
    /// For every request the middleware derives a logger from the context
    /// already on the request, or from the router's root logger, enriched with
    /// `path`, `method` and `request_id`. It binds that logger into a
    /// [`Context`](crate::Context) in the request extensions, so handlers can
    /// extract a [`Logger`](crate::Logger) or the `Context` and log with the
    /// request fields attached.
    ///
    /// After the handler returns, one summary line is written with `latency`
    /// and `status` added:
    ///
    /// - `request succeeded` at info when no error was recorded
    /// - `request failed: ...` with the error `code` for business errors
    /// - `request failed with an unknown error: ...` otherwise
    ///
    /// See [`severity`](crate::severity) for the level of failed requests.
    ///
    /// Request IDs are read from the `x-request-id` header, so call this before
    /// [`setup_request_id`](Self::setup_request_id) to see generated IDs.
    #[must_use]
    pub fn setup_logging(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Logging) {
            return self;
        }

        self.inner = self.inner.layer(axum::middleware::from_fn_with_state(
            self.logger.clone(),
            request_log::log_request,
        ));
        self
    }
}
