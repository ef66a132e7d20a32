//! Orchestration and router delegation: setup_middleware(), start(), layer(), route(), etc.

use super::router::FluentRouter;
use crate::{Logger, Result};

use {
    axum::{Router, body::Body, routing::Route},
    http::Request,
    std::{convert::Infallible, net::SocketAddr, time::Duration},
    tokio::{signal, sync::watch},
    tower::{Layer, Service},
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up all standard middleware layers in the correct order.
    ///
    /// This is the recommended way to configure middleware. Individual
    /// `setup_*` methods are available for custom orderings, but the
    /// `Include`/`Exclude` lists under `[http]` are the preferred way to
    /// trim the stack.
    ///
    /// # Middleware Order
    ///
    /// The **last layer added is the outermost layer** and executes **first**
    /// on incoming requests. From innermost to outermost:
    ///
    /// 1. **Timeout** - Answers 408 when a handler runs too long (optional)
    /// 2. **Panic catching** - Turns a panic into a 500 response
    /// 3. **Logging** - Derives the request logger and writes the summary line,
    ///    including for timeouts and panics
    /// 4. **Liveness/readiness** - Health probes (not logged)
    /// 5. **Request ID** - Generates or keeps `x-request-id` before logging reads it
    ///
    /// ```rust,no_run
    /// # use webframe::{Config, FluentRouter, Result};
    /// # fn example() -> Result<()> {
    /// // Manual setup with the same order as setup_middleware()
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .setup_timeout()
    ///     .setup_catch_panic()
    ///     .setup_logging()
    ///     .setup_liveness_readiness()
    ///     .setup_request_id();
    /// # Ok(())
    /// # }
    /// ```
    pub async fn setup_middleware(self) -> Result<Self> {
        const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
        const VERSION: &str = env!("CARGO_PKG_VERSION");
        self.logger
            .info(format_args!("Starting {PACKAGE_NAME} version {VERSION}..."));

        let router = self
            .setup_timeout() // 1. Request timeout (innermost, optional)
            .setup_catch_panic() // 2. Panic recovery, answered before logging sees it
            .setup_logging() // 3. Request logging
            .setup_liveness_readiness() // 4. Probes, added after logging so they stay quiet
            .setup_request_id(); // 5. Outermost - request ID, visible to the logging layer

        Ok(router)
    }

    /// Starts the HTTP server based on the current configuration.
    ///
    /// The server supports both HTTP/1.1 and HTTP/2 protocols automatically.
    ///
    /// # Graceful Shutdown
    ///
    /// On SIGTERM or SIGINT the server stops accepting connections and waits
    /// for in-flight requests, at most `shutdown_timeout`. If all connections
    /// drain before the timeout, shutdown completes early.
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.http.full_bind_addr();
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        let logger = self.logger.clone();
        logger.info(format_args!("Bound to {bind_addr}"));
        logger.info("Waiting for connections");

        let service = self
            .inner
            .with_state(self.state)
            .into_make_service_with_connect_info::<SocketAddr>();

        let shutdown_timeout = self.config.http.shutdown_timeout;
        let (signalled_tx, mut signalled_rx) = watch::channel(false);

        let serve_future = axum::serve(listener, service).with_graceful_shutdown(
            shutdown_signal(shutdown_timeout, logger.clone(), signalled_tx),
        );

        // The timeout only starts once a shutdown signal has been received.
        tokio::select! {
            result = serve_future => {
                logger.info("Graceful shutdown completed");
                result?;
            }
            _ = async {
                if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
                    std::future::pending::<()>().await;
                }
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                logger.warn("Graceful shutdown timeout expired, forcing shutdown");
            }
        }

        Ok(())
    }

    /// Adds a Tower layer around every route and service, forwarding to
    /// `axum::Router::layer()`.
    ///
    /// ```rust,no_run
    /// use tower::limit::ConcurrencyLimitLayer;
    /// # use webframe::{Config, FluentRouter};
    /// # fn example() -> webframe::Result<()> {
    /// let router = FluentRouter::without_state(Config::default())?
    ///     .layer(ConcurrencyLimitLayer::new(100));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.layer(layer);
        self
    }

    /// Adds a route at `path`.
    ///
    /// ```
    /// use axum::routing::get;
    /// use webframe::{Config, FluentRouter};
    ///
    /// let router = FluentRouter::without_state(Config::from_toml("").unwrap())
    ///     .unwrap()
    ///     .route("/hello", get(|| async { "Hello, World!" }))
    ///     .into_inner();
    /// ```
    #[must_use]
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter<State>) -> Self {
        self.inner = self.inner.route(path, route);
        self
    }

    /// Adds a layer that only wraps the routes added so far, forwarding to
    /// `axum::Router::route_layer()`.
    #[must_use]
    pub fn route_layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: axum::response::IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        self.inner = self.inner.route_layer(layer);
        self
    }

    /// Nests another router under a path prefix.
    ///
    /// ```rust,no_run
    /// use axum::{Router, routing::get};
    /// # use webframe::{Config, FluentRouter};
    /// # fn example() -> webframe::Result<()> {
    /// let orders = Router::new().route("/orders", get(|| async { "orders" }));
    ///
    /// let app = FluentRouter::without_state(Config::default())?
    ///     .nest("/api/v1", orders); // Routes at /api/v1/orders
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn nest(mut self, path: &str, router: Router<State>) -> Self {
        self.inner = self.inner.nest(path, router);
        self
    }

    /// Nests a Tower service under a path prefix.
    #[must_use]
    pub fn nest_service<T>(mut self, path: &str, service: T) -> Self
    where
        T: Service<Request<Body>, Response = axum::response::Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        T::Future: Send + 'static,
    {
        self.inner = self.inner.nest_service(path, service);
        self
    }

    /// Merges the routes of another router at the same level.
    #[must_use]
    pub fn merge(mut self, other: Router<State>) -> Self {
        self.inner = self.inner.merge(other);
        self
    }

    /// Adds a Tower service at an exact path.
    #[must_use]
    pub fn route_service<T>(mut self, path: &str, service: T) -> Self
    where
        T: Service<Request<Body>, Response = axum::response::Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        T::Future: Send + 'static,
    {
        self.inner = self.inner.route_service(path, service);
        self
    }

    /// Consumes the `FluentRouter` and returns the underlying `axum::Router`,
    /// typically for tests or for serving it yourself.
    pub fn into_inner(self) -> Router<State> {
        self.inner
    }
}

/// Waits for Ctrl+C or SIGTERM, then flags the shutdown and returns so that
/// axum starts draining connections. The grace period is enforced by
/// [`FluentRouter::start`].
///
/// If a signal handler cannot be installed, the function logs a warning and
/// waits on the remaining one.
async fn shutdown_signal(timeout: Duration, logger: Logger, signalled: watch::Sender<bool>) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => logger.debug("Ctrl+C signal received"),
            Err(err) => {
                logger.warn(format_args!("Failed to install Ctrl+C handler: {err}"));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal_handler) => {
                signal_handler.recv().await;
                logger.debug("SIGTERM signal received");
            }
            Err(err) => {
                logger.warn(format_args!("Failed to install SIGTERM handler: {err}"));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    logger.info(format_args!(
        "Shutdown signal received, starting graceful shutdown (timeout: {}s)",
        timeout.as_secs()
    ));
    signalled.send_replace(true);
}
