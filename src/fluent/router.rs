//! Core FluentRouter struct and initialization methods.

use {
    crate::{Config, HttpMiddleware, Logger, Result},
    axum::Router,
};

/// Fluent builder for axum::Router with configuration-based middleware setup.
///
/// This wrapper around `axum::Router` provides a fluent API for configuring middleware
/// and routes based on the application configuration. Create instances using
/// [`FluentRouter::without_state`] or [`FluentRouter::with_state`].
///
/// The router carries a root [`Logger`]. The request logging middleware derives
/// every per-request logger from it, so tests and embedders can capture a
/// router's output by injecting their own logger with [`FluentRouter::with_logger`]
/// instead of touching the process-wide default.
///
/// ```rust,no_run
/// use webframe::{Config, FluentRouter, Logger};
///
/// # fn example() -> webframe::Result<()> {
/// let config = Config::default();
/// let logger = Logger::new(config.logging.clone())?;
///
/// let router = FluentRouter::without_state(config)?
///     .with_logger(logger)
///     .setup_logging();
/// # Ok(())
/// # }
/// ```
pub struct FluentRouter<State = ()> {
    pub(crate) config: Config,
    pub(crate) state: State,
    pub(crate) inner: Router<State>,
    pub(crate) logger: Logger,
    #[cfg(feature = "postgres")]
    pub(crate) db_pool: sqlx_postgres::PgPool,
}

impl FluentRouter {
    /// Creates a new `FluentRouter` without application state.
    pub fn without_state(config: Config) -> Result<FluentRouter<()>> {
        FluentRouter::<()>::with_state(config, ())
    }
}

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Creates a new `FluentRouter` with the provided configuration.
    ///
    /// Validates the configuration and takes the process-wide default logger
    /// as the root logger. If the `postgres` feature is enabled, the pool is
    /// created (lazily connecting) and used by the readiness probe. It can also
    /// be accessed via a call to `db_pool()`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn with_state<S: Clone + Send + Sync + 'static>(
        config: Config,
        state: S,
    ) -> Result<FluentRouter<S>> {
        config.validate()?;

        #[cfg(feature = "postgres")]
        let db_pool = config.create_pgpool()?;

        Ok(FluentRouter {
            config,
            state,
            inner: Router::new(),
            logger: Logger::global().clone(),
            #[cfg(feature = "postgres")]
            db_pool,
        })
    }

    /// Replaces the root logger used by the middlewares installed afterwards.
    #[must_use]
    pub fn with_logger(self, logger: Logger) -> Self {
        Self { logger, ..self }
    }

    /// Returns the root logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Returns the configuration the router was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the configured PostgreSQL database pool.
    #[cfg(feature = "postgres")]
    pub fn db_pool(&self) -> sqlx_postgres::PgPool {
        self.db_pool.clone()
    }

    /// Helper method to check if a middleware is enabled in the configuration.
    /// Returns true if no middleware config is specified (all enabled by default),
    /// or if the middleware is explicitly enabled/not excluded.
    pub(crate) fn is_middleware_enabled(&self, middleware: HttpMiddleware) -> bool {
        self.config
            .http
            .middleware
            .as_ref()
            .map(|config| config.is_enabled(middleware))
            .unwrap_or(true)
    }
}
