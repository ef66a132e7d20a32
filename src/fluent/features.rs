//! Feature middleware: request timeouts and health probes.

use super::router::FluentRouter;
use crate::HttpMiddleware;

use {axum::routing::get, http::StatusCode, tower_http::timeout::TimeoutLayer};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up request timeout middleware.
    ///
    /// Aborts requests that take longer than the configured duration with a
    /// `408 Request Timeout` response. Nothing is installed when no timeout is
    /// configured.
    ///
    /// ```toml
    /// [http]
    /// request_timeout = "30s"  # humantime format
    /// ```
    #[must_use]
    pub fn setup_timeout(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::Timeout) {
            return self;
        }

        if let Some(timeout) = self.config.http.request_timeout {
            self.inner = self.inner.layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                timeout,
            ));
        }
        self
    }

    /// Sets up the liveness and readiness probes.
    ///
    /// - **Liveness** always answers `200 OK`
    /// - **Readiness** answers `200 OK`, or `503` when the `postgres` feature
    ///   is enabled and the database does not answer `SELECT 1`
    ///
    /// ```toml
    /// [http]
    /// liveness_route = "/live"   # Default
    /// readiness_route = "/ready" # Default
    /// ```
    #[must_use]
    pub fn setup_liveness_readiness(mut self) -> Self {
        if self.is_middleware_enabled(HttpMiddleware::Liveness) {
            let route = self.config.http.liveness_route.clone();
            self.inner = self.inner.route(&route, get(|| async { "OK\n" }));
        }

        if self.is_middleware_enabled(HttpMiddleware::Readiness) {
            let route = self.config.http.readiness_route.clone();

            #[cfg(feature = "postgres")]
            let (db_pool, logger) = (self.db_pool.clone(), self.logger.clone());

            self.inner = self.inner.route(
                &route,
                get(|| async move {
                    #[cfg(feature = "postgres")]
                    match sqlx::query("SELECT 1").execute(&db_pool).await {
                        Ok(_) => (StatusCode::OK, "OK\n"),
                        Err(e) => {
                            logger.error(format_args!("Database health check failed: {e}"));
                            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable\n")
                        }
                    }

                    #[cfg(not(feature = "postgres"))]
                    (StatusCode::OK, "OK\n")
                }),
            );
        }
        self
    }
}
